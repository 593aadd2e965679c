use crate::core::config::data::Config;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.default_provider {
            Some(provider) => println!("  default-provider: {provider}"),
            None => println!("  default-provider: (unset)"),
        }
        println!("  credential-store: {}", self.credential_store());
        match self.resume_after_save() {
            true => println!("  resume-after-save: on"),
            false => println!("  resume-after-save: off"),
        }
        println!(
            "  reprompt-delay-ms: {}",
            self.reprompt_delay().as_millis()
        );
        print_map("default-models", &self.default_models);
        print_map("base-urls", &self.base_urls);
    }
}

fn print_map(label: &str, values: &std::collections::HashMap<String, String>) {
    if values.is_empty() {
        println!("  {label}: (none set)");
        return;
    }
    println!("  {label}:");
    let mut entries: Vec<_> = values.iter().collect();
    entries.sort();
    for (provider, value) in entries {
        println!("    {provider}: {value}");
    }
}
