use std::{env, path::PathBuf};

fn probe() -> Vec<PathBuf> {
    let mut include_paths = Vec::new();
    for lib in ["krb5-gssapi", "krb5"] {
        match pkg_config::Config::new().probe(lib) {
            Ok(found) => include_paths.extend(found.include_paths),
            Err(_) => {
                // no .pc file, hope the linker can find it anyway
                let name = if lib == "krb5" { "krb5" } else { "gssapi_krb5" };
                println!("cargo:rustc-link-lib={}", name);
            }
        }
    }
    include_paths
}

fn main() {
    println!("cargo:rerun-if-changed=wrapper.h");
    let include_paths = probe();
    let bindings = bindgen::Builder::default()
        .header("wrapper.h")
        .clang_args(include_paths.iter().map(|p| format!("-I{}", p.display())))
        .allowlist_function("gss_(import_name|release_name|display_name)")
        .allowlist_function("gss_(acquire_cred|acquire_cred_from|release_cred)")
        .allowlist_function("gss_(init_sec_context|delete_sec_context)")
        .allowlist_function("gss_(release_buffer|display_status)")
        .allowlist_function("krb5_(init_context|free_context|cc_resolve|cc_destroy)")
        .allowlist_var("GSS_.*")
        .generate()
        .expect("failed to generate gssapi bindings");
    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    bindings
        .write_to_file(out_path.join("bindings.rs"))
        .expect("failed to write bindings")
}
