use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};

fn main() {
    println!("cargo:rerun-if-changed=static/");
    println!("cargo:rerun-if-changed=migrations/");

    let mut hasher = DefaultHasher::new();

    let mut entries: Vec<_> = fs::read_dir("static")
        .map(|dir| dir.filter_map(|e| e.ok()).collect())
        .unwrap_or_default();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let (Ok(contents), Some(name)) = (fs::read(&path), path.file_name()) {
            name.to_string_lossy().hash(&mut hasher);
            contents.hash(&mut hasher);
        }
    }

    let hash = format!("{:016x}", hasher.finish());
    println!("cargo:rustc-env=STATIC_HASH={}", &hash[..8]);
}
