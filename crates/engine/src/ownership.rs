//! Ownership of stored records and visibility for callers.
//!
//! A record is either global (everyone can read it, nobody owns it) or owned
//! by exactly one user. The database keeps the historical `is_global` /
//! `user_id` column pair, with `user_id = 0` on global rows; this module is
//! the only place that knows about that encoding.
//!
//! Reads and writes use different predicates on purpose: a user reads global
//! rows plus their own, but the per-user write path only ever touches rows
//! that user owns.

use sea_orm::{ColumnTrait, Condition};

pub type UserId = i32;

/// Column value stored in `user_id` for global rows.
pub const GLOBAL_OWNER_ID: UserId = 0;

/// Who owns a stored record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    Global,
    User(UserId),
}

impl Owner {
    pub fn from_columns(is_global: bool, user_id: UserId) -> Self {
        if is_global {
            Self::Global
        } else {
            Self::User(user_id)
        }
    }

    pub fn is_global(self) -> bool {
        matches!(self, Self::Global)
    }

    /// Value for the `user_id` column (and the `owner_id` JSON field).
    pub fn user_id(self) -> UserId {
        match self {
            Self::Global => GLOBAL_OWNER_ID,
            Self::User(id) => id,
        }
    }

    pub fn visible_to(self, scope: Scope) -> bool {
        match (self, scope) {
            (Self::Global, _) => true,
            (Self::User(owner), Scope::User(caller)) => owner == caller,
            (Self::User(_), Scope::Global) => false,
        }
    }

    pub fn writable_by(self, scope: Scope) -> bool {
        match (self, scope) {
            (Self::Global, Scope::Global) => true,
            (Self::User(owner), Scope::User(caller)) => owner == caller,
            _ => false,
        }
    }
}

/// The identity a query runs under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Unauthenticated, or the explicit "global only" context.
    Global,
    User(UserId),
}

impl Scope {
    /// `0` is the reserved "no user" id.
    pub fn from_caller(caller_id: UserId) -> Self {
        if caller_id == GLOBAL_OWNER_ID {
            Self::Global
        } else {
            Self::User(caller_id)
        }
    }

    /// Rows this scope may read.
    pub fn read_condition<C: ColumnTrait>(self, is_global: C, user_id: C) -> Condition {
        match self {
            Self::Global => Condition::all().add(is_global.eq(true)),
            Self::User(caller) => Condition::any()
                .add(is_global.eq(true))
                .add(user_id.eq(caller)),
        }
    }

    /// Rows this scope may update or delete.
    pub fn write_condition<C: ColumnTrait>(self, is_global: C, user_id: C) -> Condition {
        match self {
            Self::Global => Condition::all().add(is_global.eq(true)),
            Self::User(caller) => Condition::all()
                .add(is_global.eq(false))
                .add(user_id.eq(caller)),
        }
    }
}
