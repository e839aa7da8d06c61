use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");
    println!("cargo:rerun-if-changed=../../templates");

    // OUT_DIR is target/<profile>/build/backend-xxx/out; the binary lives in target/<profile>
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let profile = env::var("PROFILE").expect("PROFILE is set by cargo");
    let target_dir = Path::new(&out_dir)
        .ancestors()
        .find(|p| p.ends_with(&profile))
        .expect("Could not find target profile directory")
        .to_path_buf();

    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("Could not find workspace root")
        .to_path_buf();

    let source_config = workspace_root.join("config.toml");
    if source_config.exists() {
        let dest_config = target_dir.join("config.toml");
        fs::copy(&source_config, &dest_config)
            .unwrap_or_else(|e| panic!("Failed to copy config.toml: {}", e));
    } else {
        println!("cargo:warning=config.toml not found at {:?}, using default config", source_config);
    }

    let source_templates = workspace_root.join("templates");
    if source_templates.is_dir() {
        copy_dir(&source_templates, &target_dir.join("templates"));
    }
}

fn copy_dir(from: &Path, to: &PathBuf) {
    fs::create_dir_all(to).unwrap_or_else(|e| panic!("Failed to create {:?}: {}", to, e));
    for entry in fs::read_dir(from).unwrap_or_else(|e| panic!("Failed to read {:?}: {}", from, e)) {
        let path = entry.expect("readable directory entry").path();
        let dest = to.join(path.file_name().expect("entry has a file name"));
        if path.is_dir() {
            copy_dir(&path, &dest);
        } else {
            fs::copy(&path, &dest).unwrap_or_else(|e| panic!("Failed to copy {:?}: {}", path, e));
        }
    }
}
