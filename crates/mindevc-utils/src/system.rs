use nix::sys::utsname::uname;

/// Returns the machine hardware name of the running kernel (e.g. `x86_64`, `aarch64`).
///
/// Falls back to the architecture the binary was compiled for when `uname(2)` fails.
pub fn machine() -> String {
    uname()
        .ok()
        .and_then(|info| info.machine().to_str().map(String::from))
        .unwrap_or_else(|| std::env::consts::ARCH.to_string())
}
