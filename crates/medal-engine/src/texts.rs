//! Fixed chat texts.

use medal_core::ids::{MemberId, RoleId};
use medal_core::stats::ManualChange;

pub const SESSION_PROMPT: &str = "Elite is over - please enter your place or PvP:";
pub const TESTRUN_PROMPT: &str = "⚔️ **Test run** - here are the buttons:";
pub const RESET_DONE: &str = "All medal data has been reset.";

pub fn announcement(role: Option<RoleId>) -> String {
    let mention = role.map(|r| format!("<@&{r}> ")).unwrap_or_default();
    format!("{mention}**Elite is running now!** 🥷\nAfter the Elite you can enter your place.")
}

pub fn manual_added(member: MemberId, amount: i64, change: ManualChange) -> String {
    format!(
        "<@{member}>, **{amount}** manual medals were added.\nManual total: **{}** (before: {}).",
        change.after, change.before
    )
}

pub fn manual_removed(member: MemberId, amount: i64, change: ManualChange) -> String {
    format!(
        "<@{member}>, **{amount}** manual medals were removed.\nManual total: **{}** (before: {}).",
        change.after, change.before
    )
}

pub fn manual_set(member: MemberId, change: ManualChange) -> String {
    format!(
        "The **manual medals** of <@{member}> were set from **{}** to **{}**.",
        change.before, change.after
    )
}

pub fn info(prefix: &str) -> String {
    format!(
        "**DEUTSCH 🇩🇪**\n\
         - Der Bot erinnert automatisch zu jeder Elite.\n\
         - Nach der Elite sendet er Buttons für Platzierung / PvP / PvM (kein Rang).\n\
         - Jeder Klick trägt Medaillen & Runs automatisch ein.\n\
         - `{p}medals` → Übersicht aller Spieler.\n\
         - `{p}allmedals` → Gesamtzahl aller Medaillen (automatisch + manuell).\n\
         - `{p}collected <Zahl>` → Manuelle Medaillen **hinzufügen** (z.B. alte Runs oder vergessene Platzierungen).\n\
         - `{p}collectedremove <Zahl>` → Manuelle Medaillen wieder **abziehen**, falls du dich vertippt hast.\n\
         - `{p}setmanual @User <Zahl>` → Setzt die manuellen Medaillen eines Spielers direkt (nur Leader-Rolle).\n\n\
         **ENGLISH 🇬🇧**\n\
         - The bot automatically reminds your guild for each Elite.\n\
         - After Elite it sends buttons for placements / PvP / PvM (no rank).\n\
         - Every click updates medals & runs automatically.\n\
         - `{p}medals` → Overview of all players.\n\
         - `{p}allmedals` → Total medals (automatic + manual).\n\
         - `{p}collected <number>` → **Add** manual medals (e.g. for previous runs or missed placements).\n\
         - `{p}collectedremove <number>` → **Remove** manual medals again if you mistyped.\n\
         - `{p}setmanual @User <number>` → Directly sets a player's manual medals (Leader role only).",
        p = prefix
    )
}

pub fn command_list(prefix: &str) -> String {
    format!(
        "**Commands:**\n\
         - `{p}testrun` - test the buttons\n\
         - `{p}medals` - overview of all players\n\
         - `{p}allmedals` - total medals (automatic + manual)\n\
         - `{p}collected <number>` - **add** manual medals (e.g. old or forgotten runs)\n\
         - `{p}collectedremove <number>` - **remove** manual medals (fix typos)\n\
         - `{p}setmanual @User <number>` - set a player's manual medals directly (leader only)\n\
         - `{p}elitereset` - reset all data (leader only)\n\
         - `{p}info` - info (DE/EN)\n\
         - `{p}commands` - this command list",
        p = prefix
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announcement_mentions_role_only_when_given() {
        let loud = announcement(Some(RoleId::new(77)));
        assert!(loud.starts_with("<@&77> **Elite is running now!**"));
        let quiet = announcement(None);
        assert!(quiet.starts_with("**Elite is running now!**"));
        assert!(!quiet.contains("<@&"));
    }

    #[test]
    fn adjustment_texts_show_before_and_after() {
        let change = ManualChange { before: 5, after: 8 };
        let text = manual_added(MemberId::new(4), 3, change);
        assert!(text.starts_with("<@4>, **3** manual medals were added."));
        assert!(text.ends_with("Manual total: **8** (before: 5)."));
        assert_eq!(
            manual_set(MemberId::new(4), ManualChange { before: 8, after: 40 }),
            "The **manual medals** of <@4> were set from **8** to **40**."
        );
    }

    #[test]
    fn help_texts_use_prefix() {
        assert!(info("?").contains("`?medals`"));
        assert!(info("!").contains("**ENGLISH 🇬🇧**"));
        let list = command_list("?");
        assert!(list.contains("`?elitereset`"));
        assert!(!list.contains("`!"));
    }
}
