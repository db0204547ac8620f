//! Request bodies for outgoing messages and interaction replies.

use serde_json::{json, Value};

use medal_core::chat::{Button, ButtonStyle, InteractionReply, OutgoingMessage};

pub const MAX_BUTTONS_PER_ROW: usize = 5;

const ACTION_ROW: u8 = 1;
const BUTTON: u8 = 2;

/// Interaction callback type: reply with a message.
const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;
const FLAG_EPHEMERAL: u64 = 1 << 6;

fn style_code(style: ButtonStyle) -> u8 {
    match style {
        ButtonStyle::Primary => 1,
        ButtonStyle::Secondary => 2,
        ButtonStyle::Success => 3,
        ButtonStyle::Danger => 4,
    }
}

pub fn action_rows(buttons: &[Button]) -> Vec<Value> {
    buttons
        .chunks(MAX_BUTTONS_PER_ROW)
        .map(|row| {
            let components: Vec<Value> = row
                .iter()
                .map(|b| {
                    json!({
                        "type": BUTTON,
                        "style": style_code(b.style),
                        "label": b.label,
                        "custom_id": b.custom_id,
                    })
                })
                .collect();
            json!({ "type": ACTION_ROW, "components": components })
        })
        .collect()
}

/// Body for `POST /channels/{id}/messages`. Only explicitly listed mentions
/// notify anyone.
pub fn message_body(message: &OutgoingMessage) -> Value {
    let mut body = json!({
        "content": message.content,
        "allowed_mentions": {
            "parse": [],
            "roles": message.mentions.roles.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "users": message.mentions.users.iter().map(ToString::to_string).collect::<Vec<_>>(),
        },
    });
    if !message.buttons.is_empty() {
        body["components"] = Value::Array(action_rows(&message.buttons));
    }
    body
}

/// Body for `POST /interactions/{id}/{token}/callback`.
pub fn interaction_body(reply: &InteractionReply) -> Value {
    let flags = if reply.ephemeral { FLAG_EPHEMERAL } else { 0 };
    json!({
        "type": CHANNEL_MESSAGE_WITH_SOURCE,
        "data": {
            "content": reply.content,
            "flags": flags,
            "allowed_mentions": { "parse": [] },
        },
    })
}
