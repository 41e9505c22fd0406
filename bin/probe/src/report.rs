//! Console helpers shared by the probe binaries.

use common::Error;

pub fn section(title: &str) {
    println!("\n{}", "=".repeat(50));
    println!("{title}");
}

/// Print a failed step with any remediation hints attached to the error kind.
pub fn failure(step: &str, err: &Error) {
    println!("{step} failed: {err}");
    for hint in err.remediation() {
        println!("  {hint}");
    }
}
