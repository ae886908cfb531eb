use taskhooks_adapters::Capability;

pub fn run() {
    println!("Adapters in this build:\n");
    for capability in Capability::ALL {
        if capability.is_available() {
            println!("• {:<12} ✓ available", capability.to_string());
        } else {
            println!(
                "• {:<12} ○ not compiled in (enable feature '{}')",
                capability.to_string(),
                capability.feature()
            );
        }
    }
}
