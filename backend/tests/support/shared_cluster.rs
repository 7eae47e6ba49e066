//! One embedded PostgreSQL cluster per test binary.

use std::time::Duration;

use pg_embedded_setup_unpriv::{BootstrapResult, ClusterHandle};

const BOOTSTRAP_ATTEMPTS: usize = 5;
const BOOTSTRAP_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Start the process-wide cluster, retrying transient bootstrap failures.
pub fn shared_cluster_handle() -> BootstrapResult<&'static ClusterHandle> {
    pin_password();
    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(error) if attempt >= BOOTSTRAP_ATTEMPTS => return Err(error),
            Err(_) => {
                std::thread::sleep(BOOTSTRAP_RETRY_DELAY);
                attempt += 1;
            }
        }
    }
}

/// A reused data directory keeps the password it was initialised with, so
/// the generated default must not change between runs.
fn pin_password() {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster library starts any threads; the
        // shared handle serialises its own initialisation.
        unsafe {
            std::env::set_var("PG_PASSWORD", "solar_embedded_test");
        }
    }
}
