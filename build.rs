fn main() {
    // Host builds need no codegen; ESP-IDF builds export the toolchain
    // environment for the linker.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
