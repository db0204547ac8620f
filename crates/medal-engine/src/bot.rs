//! The bot actor.
//!
//! Every event (minute ticks, chat messages, button presses) is handled here,
//! one at a time, so the ledger and the current session never see concurrent
//! mutation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use medal_core::chat::{ChatClient, InteractionReply, OutgoingMessage};
use medal_core::clock::Clock;
use medal_core::errors::CommandError;
use medal_core::events::{BotEvent, IncomingInteraction, IncomingMessage, InteractionHandle};
use medal_core::ids::{ChannelId, GuildId, MemberId, RoleId};
use medal_core::schedule::TickAction;
use medal_core::stats::MemberStats;
use medal_store::{Ledger, PersistentLedger};

use crate::adjust;
use crate::commands::{self, Command};
use crate::reporting::{self, MESSAGE_LIMIT};
use crate::scheduler::Scheduler;
use crate::session::{panel_buttons, PanelToken, SelectionSession, SessionBoard, SessionKind};
use crate::texts;

#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Where scheduled announcements and panels go.
    pub channel_id: ChannelId,
    /// `None` accepts any guild. Direct messages are always ignored.
    pub guild_id: Option<GuildId>,
    pub elite_role: RoleId,
    pub leader_role: RoleId,
    pub prefix: String,
    pub session_ttl: Duration,
}

pub struct Bot {
    config: BotConfig,
    book: PersistentLedger,
    sessions: SessionBoard,
    scheduler: Scheduler,
    client: Arc<dyn ChatClient>,
    clock: Arc<dyn Clock>,
    /// Leaderboard replies, which resolve member names off the actor.
    reports: TaskTracker,
}

impl Bot {
    pub fn new(
        config: BotConfig,
        book: PersistentLedger,
        scheduler: Scheduler,
        client: Arc<dyn ChatClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            book,
            sessions: SessionBoard::new(),
            scheduler,
            client,
            clock,
            reports: TaskTracker::new(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        self.book.ledger()
    }

    pub fn current_session(&self) -> Option<&SelectionSession> {
        self.sessions.current()
    }

    /// Consume events until cancelled or every sender is dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<BotEvent>, cancel: CancellationToken) {
        info!(members = self.book.ledger().len(), "bot actor started");
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
            }
        }
        self.reports.close();
        self.reports.wait().await;
        info!("bot actor stopped");
    }

    /// Wait until every leaderboard reply spawned so far has been sent.
    pub async fn settle(&self) {
        self.reports.close();
        self.reports.wait().await;
        self.reports.reopen();
    }

    pub async fn handle(&mut self, event: BotEvent) {
        match event {
            BotEvent::Tick { now } => self.on_tick(now).await,
            BotEvent::Message(message) => self.on_message(message).await,
            BotEvent::Interaction(interaction) => self.on_interaction(interaction).await,
        }
    }

    fn accepts_guild(&self, guild: Option<GuildId>) -> bool {
        match (guild, self.config.guild_id) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(got), Some(want)) => got == want,
        }
    }

    async fn on_tick(&mut self, now: DateTime<Utc>) {
        match self.scheduler.poll(now) {
            TickAction::Idle => {}
            TickAction::Announce { mention_role } => {
                let role = mention_role.then_some(self.config.elite_role);
                let mut message = OutgoingMessage::text(texts::announcement(role));
                if let Some(role) = role {
                    message = message.pinging_role(role);
                }
                info!(mention_role, "announcing event");
                self.send(self.config.channel_id, message).await;
            }
            TickAction::OpenSession => {
                let panel = self.open_panel(SessionKind::Scheduled, texts::SESSION_PROMPT, now);
                self.send(self.config.channel_id, panel).await;
            }
        }
    }

    fn open_panel(&mut self, kind: SessionKind, prompt: &str, now: DateTime<Utc>) -> OutgoingMessage {
        let session = self.sessions.open(kind, now, self.config.session_ttl);
        OutgoingMessage::text(prompt).with_buttons(panel_buttons(session.id()))
    }

    async fn on_message(&mut self, message: IncomingMessage) {
        if message.author.is_bot || !self.accepts_guild(message.guild_id) {
            return;
        }
        let Some(parsed) = commands::parse(&self.config.prefix, &message.content) else {
            return;
        };
        let command = match parsed {
            Ok(command) => command,
            Err(err) => {
                debug!(member_id = %message.author.id, error = %err, "bad command arguments");
                let usage = err.usage(&self.config.prefix);
                self.send(message.channel_id, OutgoingMessage::text(usage)).await;
                return;
            }
        };

        let name = command.name();
        info!(command = name, member_id = %message.author.id, "command received");
        let replies = match self.execute(command, &message).await {
            Ok(replies) => replies,
            Err(err) => {
                log_rejection(name, &err);
                vec![OutgoingMessage::text(err.user_message())]
            }
        };
        for reply in replies {
            self.send(message.channel_id, reply).await;
        }
    }

    async fn execute(
        &mut self,
        command: Command,
        message: &IncomingMessage,
    ) -> Result<Vec<OutgoingMessage>, CommandError> {
        let author = &message.author;
        let replies = match command {
            Command::TestRun => {
                let now = self.clock.now();
                vec![self.open_panel(SessionKind::TestRun, texts::TESTRUN_PROMPT, now)]
            }
            Command::Medals => {
                let entries = reporting::leaderboard(self.book.ledger());
                let client = Arc::clone(&self.client);
                let (channel, guild) = (message.channel_id, message.guild_id);
                self.reports.spawn(send_leaderboard(client, channel, guild, entries));
                Vec::new()
            }
            Command::AllMedals => {
                let totals = reporting::grand_totals(self.book.ledger());
                vec![OutgoingMessage::text(reporting::render_totals(&totals))]
            }
            Command::Collected(amount) => {
                let change = adjust::add_manual(&mut self.book, author.id, amount)?;
                vec![OutgoingMessage::text(texts::manual_added(author.id, amount, change)).pinging_user(author.id)]
            }
            Command::CollectedRemove(amount) => {
                let change = adjust::remove_manual(&mut self.book, author.id, amount)?;
                vec![OutgoingMessage::text(texts::manual_removed(author.id, amount, change)).pinging_user(author.id)]
            }
            Command::SetManual { member, amount } => {
                let change =
                    adjust::set_manual(&mut self.book, author, self.config.leader_role, member, amount)?;
                vec![OutgoingMessage::text(texts::manual_set(member, change)).pinging_user(member)]
            }
            Command::EliteReset => {
                adjust::reset_all(&mut self.book, author, self.config.leader_role)?;
                vec![OutgoingMessage::text(texts::RESET_DONE)]
            }
            Command::Info => chunked(&texts::info(&self.config.prefix)),
            Command::Commands => chunked(&texts::command_list(&self.config.prefix)),
        };
        Ok(replies)
    }

    async fn on_interaction(&mut self, interaction: IncomingInteraction) {
        if !self.accepts_guild(interaction.guild_id) {
            return;
        }
        let Some(token) = PanelToken::decode(&interaction.custom_id) else {
            warn!(custom_id = %interaction.custom_id, "ignoring unrecognised button id");
            return;
        };

        let now = self.clock.now();
        let text = match self.sessions.select(&token, interaction.member, now, &mut self.book) {
            Ok(receipt) => receipt.confirmation(),
            Err(err) => {
                log_rejection("select", &err);
                err.user_message()
            }
        };
        self.reply(&interaction.handle, InteractionReply::ephemeral(text)).await;
    }

    async fn send(&self, channel: ChannelId, message: OutgoingMessage) {
        if let Err(e) = self.client.send_message(channel, message).await {
            error!(channel_id = %channel, error = %e, "failed to send message");
        }
    }

    async fn reply(&self, handle: &InteractionHandle, reply: InteractionReply) {
        if let Err(e) = self.client.reply_interaction(handle, reply).await {
            error!(interaction_id = %handle.id, error = %e, "failed to answer interaction");
        }
    }
}

/// Name lookups may hit the network, so this runs as its own task and the
/// actor keeps answering buttons meanwhile.
async fn send_leaderboard(
    client: Arc<dyn ChatClient>,
    channel: ChannelId,
    guild: Option<GuildId>,
    entries: Vec<(MemberId, MemberStats)>,
) {
    let mut named = Vec::with_capacity(entries.len());
    for (member, stats) in entries {
        let name = match guild {
            Some(guild) => client.display_name(guild, member).await,
            None => None,
        };
        named.push((name.unwrap_or_else(|| reporting::fallback_name(member)), stats));
    }
    for message in chunked(&reporting::render_leaderboard(&named)) {
        if let Err(e) = client.send_message(channel, message).await {
            error!(channel_id = %channel, error = %e, "failed to send leaderboard");
        }
    }
}

fn chunked(text: &str) -> Vec<OutgoingMessage> {
    reporting::chunk_lines(text, MESSAGE_LIMIT)
        .into_iter()
        .map(OutgoingMessage::text)
        .collect()
}

fn log_rejection(action: &str, err: &CommandError) {
    if matches!(err, CommandError::Persistence(_)) {
        error!(action, error_kind = err.error_kind(), error = %err, "change applied but not saved");
    } else {
        info!(action, error_kind = err.error_kind(), "request rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ManualClock, RecordingClient};
    use chrono::TimeZone;
    use chrono_tz::Europe::Vienna;
    use medal_core::events::Caller;
    use medal_core::ids::{InteractionId, MemberId};
    use medal_core::schedule::Schedule;
    use medal_core::scoring::{Outcome, Rank};
    use medal_store::MemoryStore;

    const GUILD: GuildId = GuildId::new(1);
    const PANEL_CHANNEL: ChannelId = ChannelId::new(10);
    const CMD_CHANNEL: ChannelId = ChannelId::new(11);
    const ELITE: RoleId = RoleId::new(20);
    const LEADER: RoleId = RoleId::new(30);

    struct Harness {
        bot: Bot,
        client: Arc<RecordingClient>,
        clock: Arc<ManualClock>,
        store: MemoryStore,
    }

    fn vienna(d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Vienna
            .with_ymd_and_hms(2026, 10, d, h, min, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn harness_with(client: RecordingClient) -> Harness {
        let client = Arc::new(client);
        let clock = Arc::new(ManualClock::new(vienna(19, 10, 8)));
        let store = MemoryStore::new();
        let config = BotConfig {
            channel_id: PANEL_CHANNEL,
            guild_id: Some(GUILD),
            elite_role: ELITE,
            leader_role: LEADER,
            prefix: "!".into(),
            session_ttl: Duration::from_secs(3600),
        };
        let bot = Bot::new(
            config,
            PersistentLedger::open(store.clone()).unwrap(),
            Scheduler::new(Schedule::default(), Vienna),
            client.clone(),
            clock.clone(),
        );
        Harness {
            bot,
            client,
            clock,
            store,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingClient::new())
    }

    fn message_from(author: Caller, content: &str) -> BotEvent {
        BotEvent::Message(IncomingMessage {
            channel_id: CMD_CHANNEL,
            guild_id: Some(GUILD),
            author,
            content: content.into(),
        })
    }

    fn member(id: u64) -> Caller {
        Caller {
            id: MemberId::new(id),
            roles: vec![ELITE],
            is_bot: false,
        }
    }

    fn leader(id: u64) -> Caller {
        Caller {
            id: MemberId::new(id),
            roles: vec![ELITE, LEADER],
            is_bot: false,
        }
    }

    fn click(h: &Harness, who: u64, outcome: Outcome) -> BotEvent {
        let session = h.bot.current_session().unwrap().id().clone();
        click_raw(who, PanelToken::new(session, outcome).encode())
    }

    fn click_raw(who: u64, custom_id: String) -> BotEvent {
        BotEvent::Interaction(IncomingInteraction {
            handle: InteractionHandle {
                id: InteractionId::new(who * 1000),
                token: format!("tok-{who}"),
            },
            channel_id: PANEL_CHANNEL,
            guild_id: Some(GUILD),
            member: MemberId::new(who),
            custom_id,
        })
    }

    fn place(n: u8) -> Outcome {
        Outcome::Placement(Rank::new(n).unwrap())
    }

    async fn open_session(h: &mut Harness) {
        h.bot.handle(BotEvent::Tick { now: vienna(19, 10, 8) }).await;
        h.client.clear();
    }

    // ── schedule ────────────────────────────────────────────────────

    #[tokio::test]
    async fn announcement_mentions_role_outside_quiet_hours() {
        let mut h = harness();
        h.bot.handle(BotEvent::Tick { now: vienna(19, 10, 0) }).await;
        let sent = h.client.sent();
        assert_eq!(sent.len(), 1);
        let (channel, message) = &sent[0];
        assert_eq!(*channel, PANEL_CHANNEL);
        assert!(message.content.starts_with("<@&20> "));
        assert_eq!(message.mentions.roles, vec![ELITE]);
        assert!(message.buttons.is_empty());
    }

    #[tokio::test]
    async fn quiet_hour_announcement_has_no_mention() {
        let mut h = harness();
        h.bot.handle(BotEvent::Tick { now: vienna(19, 22, 0) }).await;
        let sent = h.client.sent();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].1.content.contains("<@&"));
        assert!(sent[0].1.mentions.roles.is_empty());
    }

    #[tokio::test]
    async fn session_minute_posts_panel_once() {
        let mut h = harness();
        let at = vienna(19, 10, 8);
        h.bot.handle(BotEvent::Tick { now: at }).await;
        h.bot.handle(BotEvent::Tick { now: at + chrono::Duration::seconds(20) }).await;
        let sent = h.client.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.content, texts::SESSION_PROMPT);
        assert_eq!(sent[0].1.buttons.len(), 9);
        assert!(h.bot.current_session().is_some());
    }

    #[tokio::test]
    async fn off_hours_do_nothing() {
        let mut h = harness();
        for (hour, minute) in [(9, 0), (9, 8), (10, 5), (11, 0)] {
            h.bot.handle(BotEvent::Tick { now: vienna(19, hour, minute) }).await;
        }
        assert!(h.client.sent().is_empty());
        assert!(h.bot.current_session().is_none());
    }

    // ── selection ───────────────────────────────────────────────────

    #[tokio::test]
    async fn first_come_first_served_placements() {
        let mut h = harness();
        open_session(&mut h).await;

        let ev = click(&h, 1, place(1));
        h.bot.handle(ev).await;
        assert_eq!(h.client.last_reply().unwrap().content, "Thanks for taking **Place 1**! (+8 medals)");
        assert!(h.client.last_reply().unwrap().ephemeral);

        let ev = click(&h, 2, place(1));
        h.bot.handle(ev).await;
        assert_eq!(h.client.last_reply().unwrap().content, "Place 1 is already taken.");

        let ev = click(&h, 2, place(2));
        h.bot.handle(ev).await;

        let ev = click(&h, 1, Outcome::Pvp);
        h.bot.handle(ev).await;
        assert_eq!(
            h.client.last_reply().unwrap().content,
            "You already made a selection for this run."
        );

        let a = h.bot.ledger().get(MemberId::new(1)).unwrap();
        assert_eq!((a.auto_medals, a.pvm_runs, a.pvp_runs), (8, 1, 0));
        let b = h.bot.ledger().get(MemberId::new(2)).unwrap();
        assert_eq!((b.auto_medals, b.pvm_runs), (6, 1));
        assert_eq!(h.store.save_count(), 2);
        assert_eq!(h.store.snapshot().unwrap(), *h.bot.ledger());
    }

    #[tokio::test]
    async fn pvp_and_no_rank_for_many() {
        let mut h = harness();
        open_session(&mut h).await;
        for who in 1..=3 {
            let ev = click(&h, who, Outcome::Pvp);
            h.bot.handle(ev).await;
        }
        let ev = click(&h, 4, Outcome::NoRank);
        h.bot.handle(ev).await;
        assert_eq!(h.client.last_reply().unwrap().content, "Thanks for joining as **PvM (no rank)**! (0 medals)");
        assert_eq!(h.bot.ledger().get(MemberId::new(3)).unwrap().pvp_runs, 1);
        assert_eq!(h.bot.ledger().get(MemberId::new(4)).unwrap().pvm_runs, 1);
    }

    #[tokio::test]
    async fn old_panel_is_rejected_after_new_session() {
        let mut h = harness();
        open_session(&mut h).await;
        let stale = click(&h, 1, place(1));

        h.bot.handle(BotEvent::Tick { now: vienna(19, 12, 8) }).await;
        h.bot.handle(stale).await;
        assert_eq!(
            h.client.last_reply().unwrap().content,
            CommandError::SessionExpired.user_message()
        );
        assert!(h.bot.ledger().is_empty());

        let fresh = click(&h, 1, place(1));
        h.bot.handle(fresh).await;
        assert_eq!(h.bot.ledger().get(MemberId::new(1)).unwrap().auto_medals, 8);
    }

    #[tokio::test]
    async fn session_expires_after_ttl() {
        let mut h = harness();
        open_session(&mut h).await;
        h.clock.advance(chrono::Duration::minutes(61));
        let ev = click(&h, 1, place(3));
        h.bot.handle(ev).await;
        assert_eq!(
            h.client.last_reply().unwrap().content,
            CommandError::SessionExpired.user_message()
        );
        assert!(h.bot.ledger().is_empty());
    }

    #[tokio::test]
    async fn malformed_button_is_ignored() {
        let mut h = harness();
        open_session(&mut h).await;
        h.bot.handle(click_raw(1, "elite:whatever:p12".into())).await;
        h.bot.handle(click_raw(1, "something-else".into())).await;
        assert!(h.client.replies().is_empty());
        assert!(h.bot.ledger().is_empty());
    }

    #[tokio::test]
    async fn unsaved_selection_is_reported() {
        let mut h = harness();
        open_session(&mut h).await;
        h.store.set_failing(true);
        let ev = click(&h, 1, place(1));
        h.bot.handle(ev).await;
        assert_eq!(
            h.client.last_reply().unwrap().content,
            CommandError::Persistence(String::new()).user_message()
        );
        assert_eq!(h.bot.ledger().get(MemberId::new(1)).unwrap().auto_medals, 8);
    }

    // ── commands ────────────────────────────────────────────────────

    #[tokio::test]
    async fn testrun_opens_panel_in_invoking_channel() {
        let mut h = harness();
        h.bot.handle(message_from(member(1), "!testrun")).await;
        let sent = h.client.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, CMD_CHANNEL);
        assert_eq!(sent[0].1.content, texts::TESTRUN_PROMPT);
        assert_eq!(sent[0].1.buttons.len(), 9);

        let ev = click(&h, 5, place(7));
        h.bot.handle(ev).await;
        assert_eq!(h.bot.ledger().get(MemberId::new(5)).unwrap().auto_medals, 1);
    }

    #[tokio::test]
    async fn testrun_leaves_scheduled_panel_open() {
        let mut h = harness();
        open_session(&mut h).await;
        let live = click(&h, 5, Outcome::Pvp);

        h.clock.set(vienna(19, 10, 20));
        h.bot.handle(message_from(leader(9), "!testrun")).await;
        let trial = click(&h, 6, place(1));

        h.bot.handle(live).await;
        assert_eq!(
            h.client.last_reply().unwrap().content,
            "Thanks for joining as **PvP**! (0 medals)"
        );
        assert_eq!(h.bot.ledger().get(MemberId::new(5)).unwrap().pvp_runs, 1);

        h.bot.handle(trial).await;
        assert_eq!(h.bot.ledger().get(MemberId::new(6)).unwrap().auto_medals, 8);
    }

    #[tokio::test]
    async fn collected_and_remove() {
        let mut h = harness();
        h.bot.handle(message_from(member(7), "!collected 5")).await;
        let last = h.client.sent().pop().unwrap().1;
        assert_eq!(last.content, "<@7>, **5** manual medals were added.\nManual total: **5** (before: 0).");
        assert_eq!(last.mentions.users, vec![MemberId::new(7)]);

        h.bot.handle(message_from(member(7), "!collectedremove 9")).await;
        assert_eq!(
            h.client.last_content().unwrap(),
            "<@7>, **9** manual medals were removed.\nManual total: **0** (before: 5)."
        );
        assert_eq!(h.bot.ledger().get(MemberId::new(7)).unwrap().manual_medals, 0);
    }

    #[tokio::test]
    async fn negative_amount_is_rejected() {
        let mut h = harness();
        h.bot.handle(message_from(member(7), "!collected -3")).await;
        assert_eq!(h.client.last_content().unwrap(), "Negative numbers are not allowed 😅");
        assert!(h.bot.ledger().is_empty());
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn set_manual_needs_leader() {
        let mut h = harness();
        h.bot.handle(message_from(member(7), "!setmanual <@8> 40")).await;
        assert_eq!(
            h.client.last_content().unwrap(),
            "Only the leader role may use this command."
        );
        assert!(h.bot.ledger().is_empty());

        h.bot.handle(message_from(leader(9), "!setmanual <@8> 40")).await;
        assert_eq!(
            h.client.last_content().unwrap(),
            "The **manual medals** of <@8> were set from **0** to **40**."
        );
        assert_eq!(h.bot.ledger().get(MemberId::new(8)).unwrap().manual_medals, 40);
    }

    #[tokio::test]
    async fn reset_needs_leader() {
        let mut h = harness();
        h.bot.handle(message_from(member(7), "!collected 5")).await;
        h.bot.handle(message_from(member(7), "!elitereset")).await;
        assert_eq!(h.bot.ledger().len(), 1);

        h.bot.handle(message_from(leader(9), "!elitereset")).await;
        assert_eq!(h.client.last_content().unwrap(), texts::RESET_DONE);
        assert!(h.bot.ledger().is_empty());
        assert!(h.store.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn medals_lists_by_total_with_names() {
        let client = RecordingClient::new().with_name(MemberId::new(2), "Mira");
        let mut h = harness_with(client);
        h.bot.handle(message_from(member(1), "!medals")).await;
        h.bot.settle().await;
        assert_eq!(h.client.last_content().unwrap(), reporting::NO_DATA);

        h.bot.handle(message_from(member(1), "!collected 3")).await;
        h.bot.handle(message_from(member(2), "!collected 9")).await;
        h.client.clear();

        h.bot.handle(message_from(member(1), "!medals")).await;
        h.bot.settle().await;
        let text = h.client.last_content().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("**Mira** - 9 medals"));
        assert!(lines[2].starts_with("**ID 1** - 3 medals"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_name_lookups_do_not_delay_buttons() {
        let client = RecordingClient::new().with_name_delay(Duration::from_secs(1));
        let mut h = harness_with(client);
        for who in 1..=10 {
            h.bot.handle(message_from(member(who), "!collected 1")).await;
        }
        open_session(&mut h).await;

        let started = tokio::time::Instant::now();
        h.bot.handle(message_from(member(1), "!medals")).await;
        let ev = click(&h, 5, Outcome::Pvp);
        h.bot.handle(ev).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(
            h.client.last_reply().unwrap().content,
            "Thanks for joining as **PvP**! (0 medals)"
        );
        assert!(h.client.sent().is_empty());

        h.bot.settle().await;
        assert!(started.elapsed() >= Duration::from_secs(10));
        let sent = h.client.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, CMD_CHANNEL);
        assert_eq!(sent[0].1.content.lines().count(), 11);
    }

    #[tokio::test]
    async fn allmedals_sums_everything() {
        let mut h = harness();
        open_session(&mut h).await;
        let ev = click(&h, 1, place(1));
        h.bot.handle(ev).await;
        h.bot.handle(message_from(member(2), "!collected 4")).await;
        h.bot.handle(message_from(member(2), "!allmedals")).await;
        let text = h.client.last_content().unwrap();
        assert!(text.contains("Automatic: **8**"));
        assert!(text.contains("Manual: **4**"));
        assert!(text.contains("Total: **12**"));
    }

    #[tokio::test]
    async fn usage_reply_for_bad_arguments() {
        let mut h = harness();
        h.bot.handle(message_from(member(1), "!collected lots")).await;
        assert_eq!(h.client.last_content().unwrap(), "Usage: `!collected <number>`");
    }

    #[tokio::test]
    async fn help_aliases_and_info() {
        let mut h = harness();
        for alias in ["!commands", "!comands", "!help"] {
            h.bot.handle(message_from(member(1), alias)).await;
            assert!(h.client.last_content().unwrap().starts_with("**Commands:**"));
        }
        h.bot.handle(message_from(member(1), "!info")).await;
        assert!(h.client.last_content().unwrap().contains("**ENGLISH 🇬🇧**"));
    }

    #[tokio::test]
    async fn ignores_bots_dms_other_guilds_and_chatter() {
        let mut h = harness();
        let mut bot_author = member(1);
        bot_author.is_bot = true;
        h.bot.handle(message_from(bot_author, "!collected 5")).await;

        h.bot
            .handle(BotEvent::Message(IncomingMessage {
                channel_id: CMD_CHANNEL,
                guild_id: None,
                author: member(1),
                content: "!collected 5".into(),
            }))
            .await;
        h.bot
            .handle(BotEvent::Message(IncomingMessage {
                channel_id: CMD_CHANNEL,
                guild_id: Some(GuildId::new(999)),
                author: member(1),
                content: "!collected 5".into(),
            }))
            .await;
        h.bot.handle(message_from(member(1), "hello there")).await;
        h.bot.handle(message_from(member(1), "!dance")).await;

        assert!(h.client.sent().is_empty());
        assert!(h.bot.ledger().is_empty());
    }

    #[tokio::test]
    async fn send_failures_do_not_stop_the_bot() {
        let mut h = harness();
        h.client.set_failing(true);
        h.bot.handle(message_from(member(1), "!collected 5")).await;
        assert_eq!(h.bot.ledger().get(MemberId::new(1)).unwrap().manual_medals, 5);
        h.client.set_failing(false);
        h.bot.handle(message_from(member(1), "!collected 1")).await;
        assert_eq!(h.bot.ledger().get(MemberId::new(1)).unwrap().manual_medals, 6);
    }

    // ── run loop ────────────────────────────────────────────────────

    #[tokio::test]
    async fn run_processes_events_in_order_until_senders_drop() {
        let h = harness();
        let client = h.client.clone();
        let store = h.store.clone();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(h.bot.run(rx, CancellationToken::new()));

        tx.send(message_from(member(1), "!collected 2")).await.unwrap();
        tx.send(message_from(member(1), "!collected 3")).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(client.sent().len(), 2);
        let saved = store.snapshot().unwrap();
        assert_eq!(saved.get(MemberId::new(1)).unwrap().manual_medals, 5);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let h = harness();
        let (_tx, rx) = mpsc::channel::<BotEvent>(1);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(h.bot.run(rx, cancel.clone()));
        cancel.cancel();
        task.await.unwrap();
    }
}
