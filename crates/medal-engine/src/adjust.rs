//! Manual medal adjustments. Amounts arrive signed from the command parser
//! and are rejected before anything is touched if negative.

use tracing::info;

use medal_core::errors::CommandError;
use medal_core::events::Caller;
use medal_core::ids::{MemberId, RoleId};
use medal_core::stats::ManualChange;
use medal_store::PersistentLedger;

fn non_negative(amount: i64) -> Result<u64, CommandError> {
    u64::try_from(amount).map_err(|_| CommandError::NegativeAmount(amount))
}

pub fn require_role(caller: &Caller, role: RoleId) -> Result<(), CommandError> {
    if caller.has_role(role) {
        Ok(())
    } else {
        Err(CommandError::PermissionDenied)
    }
}

pub fn add_manual(
    book: &mut PersistentLedger,
    member: MemberId,
    amount: i64,
) -> Result<ManualChange, CommandError> {
    let amount = non_negative(amount)?;
    let change = book.update(|ledger| ledger.get_or_create(member).add_manual(amount))?;
    info!(member_id = %member, amount, after = change.after, "manual medals added");
    Ok(change)
}

pub fn remove_manual(
    book: &mut PersistentLedger,
    member: MemberId,
    amount: i64,
) -> Result<ManualChange, CommandError> {
    let amount = non_negative(amount)?;
    let change = book.update(|ledger| ledger.get_or_create(member).remove_manual(amount))?;
    info!(member_id = %member, amount, after = change.after, "manual medals removed");
    Ok(change)
}

/// Leader only. The role check runs before the amount check.
pub fn set_manual(
    book: &mut PersistentLedger,
    caller: &Caller,
    leader_role: RoleId,
    member: MemberId,
    amount: i64,
) -> Result<ManualChange, CommandError> {
    require_role(caller, leader_role)?;
    let amount = non_negative(amount)?;
    let change = book.update(|ledger| ledger.get_or_create(member).set_manual(amount))?;
    info!(
        member_id = %member,
        by = %caller.id,
        before = change.before,
        after = change.after,
        "manual medals set"
    );
    Ok(change)
}

/// Leader only.
pub fn reset_all(
    book: &mut PersistentLedger,
    caller: &Caller,
    leader_role: RoleId,
) -> Result<(), CommandError> {
    require_role(caller, leader_role)?;
    let members = book.ledger().len();
    book.reset()?;
    info!(by = %caller.id, members, "ledger reset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medal_store::MemoryStore;

    const LEADER: RoleId = RoleId::new(9);
    const TARGET: MemberId = MemberId::new(100);

    fn book() -> (PersistentLedger, MemoryStore) {
        let store = MemoryStore::new();
        (PersistentLedger::open(store.clone()).unwrap(), store)
    }

    fn caller(roles: &[RoleId]) -> Caller {
        Caller {
            id: MemberId::new(1),
            roles: roles.to_vec(),
            is_bot: false,
        }
    }

    #[test]
    fn add_reports_before_and_after() {
        let (mut book, store) = book();
        assert_eq!(add_manual(&mut book, TARGET, 5).unwrap(), ManualChange { before: 0, after: 5 });
        assert_eq!(add_manual(&mut book, TARGET, 3).unwrap(), ManualChange { before: 5, after: 8 });
        assert_eq!(store.save_count(), 2);
    }

    #[test]
    fn add_zero_is_allowed() {
        let (mut book, _) = book();
        assert_eq!(add_manual(&mut book, TARGET, 0).unwrap(), ManualChange { before: 0, after: 0 });
        assert!(book.stats(TARGET).is_some());
    }

    #[test]
    fn negative_amounts_change_nothing() {
        let (mut book, store) = book();
        assert_eq!(add_manual(&mut book, TARGET, -1), Err(CommandError::NegativeAmount(-1)));
        assert_eq!(remove_manual(&mut book, TARGET, -4), Err(CommandError::NegativeAmount(-4)));
        assert_eq!(
            set_manual(&mut book, &caller(&[LEADER]), LEADER, TARGET, -2),
            Err(CommandError::NegativeAmount(-2))
        );
        assert!(book.ledger().is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn remove_clamps_at_zero() {
        let (mut book, _) = book();
        add_manual(&mut book, TARGET, 5).unwrap();
        assert_eq!(remove_manual(&mut book, TARGET, 3).unwrap(), ManualChange { before: 5, after: 2 });
        assert_eq!(remove_manual(&mut book, TARGET, 10).unwrap(), ManualChange { before: 2, after: 0 });
    }

    #[test]
    fn remove_never_touches_auto_medals() {
        let (mut book, _) = book();
        book.update(|l| l.get_or_create(TARGET).record_placement(8)).unwrap();
        remove_manual(&mut book, TARGET, 100).unwrap();
        let stats = book.stats(TARGET).unwrap();
        assert_eq!((stats.auto_medals, stats.manual_medals), (8, 0));
    }

    #[test]
    fn set_requires_leader_before_amount_check() {
        let (mut book, _) = book();
        let plain = caller(&[RoleId::new(3)]);
        assert_eq!(
            set_manual(&mut book, &plain, LEADER, TARGET, -5),
            Err(CommandError::PermissionDenied)
        );
        assert_eq!(
            set_manual(&mut book, &plain, LEADER, TARGET, 5),
            Err(CommandError::PermissionDenied)
        );
        assert!(book.ledger().is_empty());

        let change = set_manual(&mut book, &caller(&[LEADER]), LEADER, TARGET, 40).unwrap();
        assert_eq!(change, ManualChange { before: 0, after: 40 });
    }

    #[test]
    fn reset_is_leader_only() {
        let (mut book, store) = book();
        add_manual(&mut book, TARGET, 5).unwrap();

        assert_eq!(reset_all(&mut book, &caller(&[]), LEADER), Err(CommandError::PermissionDenied));
        assert_eq!(book.ledger().len(), 1);

        reset_all(&mut book, &caller(&[LEADER]), LEADER).unwrap();
        assert!(book.ledger().is_empty());
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[test]
    fn save_failure_keeps_change_in_memory() {
        let (mut book, store) = book();
        store.set_failing(true);
        let err = add_manual(&mut book, TARGET, 5).unwrap_err();
        assert!(matches!(err, CommandError::Persistence(_)));
        assert_eq!(book.stats(TARGET).unwrap().manual_medals, 5);
    }
}
