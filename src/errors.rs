/// Ways resolving a delegated call can fail
///
/// Every variant is fatal to the one resolution that raised it. Participants are rendered to
/// `Class.name:(args)ret` strings at the point of failure so errors stay detached from the
/// class-graph arenas.
#[derive(Debug)]
pub enum Error {
    /// The candidate pool was empty after construction-time filtering
    NoCandidates,

    /// No candidate in the pool is visible from the intercepted call's class
    NoVisibleCandidate {
        call: String,
    },

    /// Every visible candidate was refused by a binder, the defaults provider, or the
    /// termination handler
    NoBindableCandidate {
        call: String,
        considered: Vec<String>,
    },

    /// The resolver chain could not order two successful bindings
    AmbiguousBinding {
        call: String,
        left: String,
        right: String,
    },

    /// Code was requested from an outcome that never produced any
    IllegalFragmentUse {
        reason: String,
    },

    /// The requested type conversion is not expressible
    UnsupportedConversion {
        source: String,
        target: String,
    },
}
