//! Startup banner

use super::config::is_all_interfaces;
use super::constants::APP_NAME;

/// Print the startup banner with the upload URL and storage locations
pub fn print_banner(host: &str, port: u16, data_dir: &str, files_dir: &str, index: &str) {
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };

    const W: usize = 10;

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/",
        "Upload:", display_host, port
    );
    if host == "127.0.0.1" || host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }
    println!("  \x1b[90m➜  {:<W$} {}\x1b[0m", "Data:", data_dir);
    println!("  \x1b[90m➜  {:<W$} {}\x1b[0m", "Files:", files_dir);
    println!("  \x1b[90m➜  {:<W$} {}\x1b[0m", "Index:", index);
    println!();
}
