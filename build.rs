fn main() {
    println!("cargo:rerun-if-env-changed=LOADCTL_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=LOADCTL_WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=LOADCTL_CONNECTION_STRING");

    // ESP-IDF link arguments are only needed for the flash build.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
