//! Domain constants
//!
//! Reserved keywords of the declarative configuration format.

// ============================================================================
// SECTION NAMES
// ============================================================================

/// Top-level section holding leaf components
pub const COMPONENTS_SECTION: &str = "components";

/// Top-level section holding composites
pub const COMPOSITES_SECTION: &str = "composites";

/// Top-level section holding workflows
pub const WORKFLOWS_SECTION: &str = "workflows";

// ============================================================================
// ENTRY KEYWORDS
// ============================================================================

/// Key naming the registered factory of an entry
pub const CONSTRUCTOR_KEY: &str = "constructor";

/// Key holding the static parameter map of an entry
pub const PARAMS_KEY: &str = "params";

/// Key flagging an entry for construction at container startup
pub const EAGER_KEY: &str = "eager";

/// Key holding named instance overrides that share one constructor
pub const INSTANCES_KEY: &str = "instances";

/// Suffix marking a parameter whose value names another object
pub const REFERENCE_SUFFIX: &str = "_ref";

/// Separator between segments of a qualified name
pub const NAME_SEPARATOR: char = '.';

/// Alternative separator accepted in names and normalized to [`NAME_SEPARATOR`]
pub const PATH_SEPARATOR: char = '/';
