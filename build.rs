fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // ESP-IDF link arguments are only needed for firmware images; host
    // builds (tests, fuzzing) skip the toolchain entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
