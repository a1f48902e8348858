fn main() {
    // ESP-IDF environment export is only needed for the hardware build;
    // host builds (tests, simulation) have nothing to generate.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
