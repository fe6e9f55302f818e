//! External network discovery.

use tracing::warn;

/// Discover this host's public IP by asking an echo service. Returns `None`
/// when the lookup fails; callers provision without the IP-dependent rules.
#[must_use]
pub fn external_ip() -> Option<String> {
    match ureq::get("https://icanhazip.com").call() {
        Ok(mut response) => match response.body_mut().read_to_string() {
            Ok(body) => {
                let ip = body.trim();
                if ip.is_empty() {
                    None
                } else {
                    Some(ip.to_owned())
                }
            }
            Err(err) => {
                warn!(error = %err, "could not read external IP response");
                None
            }
        },
        Err(err) => {
            warn!(error = %err, "could not discover external IP");
            None
        }
    }
}
