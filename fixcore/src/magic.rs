/// Name of the environment variable containing the path to the options file.
/// If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/fixcore/options.toml` or `$HOME/.config/fixcore/options.toml`
///  (2) on Windows: `%APPDATA%\fixcore\options.toml`
pub const ENV_CONFIG_PATH: &str = "FIXCORE_CONFIG_PATH";

/// Trace class receiving the final elaborated term of every derived principle.
pub const TRACE_INDUCTION: &str = "trace.fixpoint.induction";

/// Trace class receiving the unfolded approximation relations.
pub const TRACE_UNFOLD: &str = "trace.fixpoint.unfold";

/// Trace class receiving the partial-correctness statement.
pub const TRACE_PARTIAL_CORRECTNESS: &str = "trace.fixpoint.partial_correctness";

/// Postfixes of the reserved names this crate realizes.
pub const POSTFIX_INDUCT: &str = "induct";
pub const POSTFIX_COINDUCT: &str = "coinduct";
pub const POSTFIX_MUTUAL_INDUCT: &str = "mutual_induct";
pub const POSTFIX_FIXPOINT_INDUCT: &str = "fixpoint_induct";
pub const POSTFIX_PARTIAL_CORRECTNESS: &str = "partial_correctness";

/// Binder names used in emitted statements.
pub const MOTIVE_NAME: &str = "motive";
pub const ADM_NAME: &str = "adm";
pub const STEP_NAME: &str = "h";
pub const IH_NAME: &str = "ih";
pub const GUARD_NAME: &str = "hrel";
pub const HIT_NAME: &str = "heq";
