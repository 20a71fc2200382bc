use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Forwards the SoC capability flags from `generated/rust-cfg` as rustc cfgs.
///
/// Without a `BUILDINC_DIRECTORY` there is no SoC to describe; only the
/// hardware-independent parts of the crate get built.
pub fn cfg() {
    println!("cargo:rerun-if-env-changed=BUILDINC_DIRECTORY");
    let out_dir = match env::var("BUILDINC_DIRECTORY") {
        Ok(dir) => dir,
        Err(_) => return
    };
    let cfg_path = Path::new(&out_dir).join("generated").join("rust-cfg");
    println!("cargo:rerun-if-changed={}", cfg_path.display());

    let f = match File::open(&cfg_path) {
        Ok(f) => BufReader::new(f),
        Err(err) => panic!("cannot open {}: {}", cfg_path.display(), err)
    };
    for line in f.lines() {
        match line {
            Ok(line) => println!("cargo:rustc-cfg={}", line),
            Err(err) => panic!("cannot read {}: {}", cfg_path.display(), err)
        }
    }
}
