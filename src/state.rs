use crate::auth::{RoleGuard, TokenService};
use crate::config::Config;
use crate::service::{AttendanceLedger, EmployeeDirectory};
use crate::store::Store;

/// Everything the handlers need, built once from [`Config`] and a connected
/// [`Store`].
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub tokens: TokenService,
    pub directory: EmployeeDirectory,
    pub ledger: AttendanceLedger,
    pub guard: RoleGuard,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> Self {
        let tokens = TokenService::new(config.jwt_secret.clone(), config.access_token_ttl);
        let directory = EmployeeDirectory::new(store.employees(), config.duplicate_user_policy);
        let ledger = AttendanceLedger::new(store.attendance(), config.attendance_update_policy);
        let guard = RoleGuard::new(directory.clone());

        Self {
            config,
            store,
            tokens,
            directory,
            ledger,
            guard,
        }
    }
}
