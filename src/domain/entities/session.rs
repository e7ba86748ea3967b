use uuid::Uuid;

/// Who is calling. Every facade operation resolves its backing store from
/// this exactly once: guests hit the device-keyed store, accounts hit the
/// multi-tenant store. Sharing and migration require an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    Guest { device_id: Uuid },
    Account { account_id: Uuid },
}

impl Session {
    /// The partition key inside whichever store this session routes to.
    pub fn owner_id(&self) -> Uuid {
        match self {
            Session::Guest { device_id } => *device_id,
            Session::Account { account_id } => *account_id,
        }
    }

    pub fn account_id(&self) -> Option<Uuid> {
        match self {
            Session::Account { account_id } => Some(*account_id),
            Session::Guest { .. } => None,
        }
    }

    pub fn is_account(&self) -> bool {
        matches!(self, Session::Account { .. })
    }
}
