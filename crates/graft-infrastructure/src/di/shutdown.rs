//! Disconnect sweep shared by shutdown and startup rollback

use graft_domain::error::{ShutdownFailure, ShutdownReason};
use graft_domain::value_objects::Instance;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, warn};

/// Disconnect every managed instance in iteration order
///
/// Failures never stop the sweep. Once `deadline` has passed, the
/// remaining instances are reported as abandoned without being touched.
pub(crate) async fn disconnect_all<'a, I>(instances: I, deadline: Instant) -> Vec<ShutdownFailure>
where
    I: IntoIterator<Item = &'a Instance>,
{
    let mut failures = Vec::new();
    for instance in instances {
        let Some(lifecycle) = instance.lifecycle() else {
            continue;
        };
        let failure = |reason| ShutdownFailure {
            tier: instance.tier(),
            name: instance.name().to_string(),
            reason,
        };

        if Instant::now() >= deadline {
            warn!(name = %instance.name(), tier = %instance.tier(), "Deadline passed, abandoning");
            failures.push(failure(ShutdownReason::Abandoned));
            continue;
        }

        match timeout_at(deadline, lifecycle.disconnect()).await {
            Ok(Ok(())) => {
                debug!(name = %instance.name(), tier = %instance.tier(), "Disconnected");
            }
            Ok(Err(e)) => {
                error!(name = %instance.name(), tier = %instance.tier(), error = %e, "Disconnect failed");
                failures.push(failure(ShutdownReason::Failed(e.to_string())));
            }
            Err(_) => {
                error!(name = %instance.name(), tier = %instance.tier(), "Disconnect timed out");
                failures.push(failure(ShutdownReason::TimedOut));
            }
        }
    }
    failures
}
