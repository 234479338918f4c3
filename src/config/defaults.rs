//! Default values for relsentry configuration.

/// Default directory scanned for per-entity CSV extracts.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default path of the persisted rule definition list.
pub const DEFAULT_DEFINITIONS_PATH: &str = "definitions.json";

/// Default directory for report artifacts (findings CSV, markdown report).
pub const DEFAULT_REPORTS_DIR: &str = "reports";

/// Default number of accounts shown in the top-accounts ranking.
pub const DEFAULT_TOP_ACCOUNTS: usize = 5;

/// Default role label identifying SOL referents.
pub const DEFAULT_SOL_ROLE: &str = "Referente SOL-APP";

/// Default contact-point type a SOL referent must carry.
pub const DEFAULT_SOL_EMAIL_TYPE: &str = "E-mail SOL";
