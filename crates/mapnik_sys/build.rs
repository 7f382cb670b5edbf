// build.rs
// Build script that bakes Mapnik's default plugin and font directories into the crate

use std::env;
use std::process::Command;

const FALLBACK_PLUGIN_DIR: &str = "/usr/local/lib/mapnik/input";
const FALLBACK_FONT_DIR: &str = "/usr/local/lib/mapnik/fonts";

/// Run `mapnik-config <flag>` and return its trimmed stdout
fn query_mapnik_config(tool: &str, flag: &str) -> Option<String> {
    let output = match Command::new(tool).arg(flag).output() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("warning: Failed to run {} {}: {}", tool, flag, e);
            return None;
        }
    };

    if !output.status.success() {
        eprintln!(
            "warning: {} {} failed with exit code: {}",
            tool,
            flag,
            output.status.code().unwrap_or(-1)
        );
        return None;
    }

    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SKIP_MAPNIK_CONFIG");
    println!("cargo:rerun-if-env-changed=MAPNIK_CONFIG");

    // Allow skipping the probe with an env var
    let skip_probe = env::var("SKIP_MAPNIK_CONFIG").is_ok();

    let tool = env::var("MAPNIK_CONFIG").unwrap_or_else(|_| "mapnik-config".to_string());

    let (plugin_dir, font_dir) = if skip_probe {
        eprintln!("info: Skipping mapnik-config probe (SKIP_MAPNIK_CONFIG set)");
        (None, None)
    } else {
        (
            query_mapnik_config(&tool, "--input-plugins"),
            query_mapnik_config(&tool, "--fonts"),
        )
    };

    let plugin_dir = plugin_dir.unwrap_or_else(|| {
        eprintln!("info: Using fallback plugin directory {}", FALLBACK_PLUGIN_DIR);
        FALLBACK_PLUGIN_DIR.to_string()
    });
    let font_dir = font_dir.unwrap_or_else(|| {
        eprintln!("info: Using fallback font directory {}", FALLBACK_FONT_DIR);
        FALLBACK_FONT_DIR.to_string()
    });

    println!("cargo:rustc-env=MAPNIK_SYS_PLUGIN_DIR={}", plugin_dir);
    println!("cargo:rustc-env=MAPNIK_SYS_FONT_DIR={}", font_dir);
}
