use std::{env, process::Command};

fn main() {
    // RUSTC is always set by cargo for build scripts.
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());

    let version = match Command::new(&rustc).arg("--version").output() {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().to_string(),
        Ok(out) => {
            println!("cargo:warning=`{} --version` exited with {}", rustc, out.status);
            "unknown".to_string()
        }
        Err(e) => {
            println!("cargo:warning=Could NOT run {}: {}", rustc, e);
            "unknown".to_string()
        }
    };

    // Exposed to /api/status as the runtime's compiler version.
    println!("cargo:rustc-env=COLABORADORES_RUSTC_VERSION={}", version);
    println!("cargo:rerun-if-changed=build.rs");
}
