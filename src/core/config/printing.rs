use crate::core::config::data::Config;
use crate::core::config::keys::format_bool;

fn print_optional<T: std::fmt::Display>(key: &str, value: Option<T>) {
    match value {
        Some(value) => println!("  {key}: {value}"),
        None => println!("  {key}: (unset)"),
    }
}

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  model: {}", self.model_or_default());
        println!("  base-url: {}", self.base_url_or_default());
        print_optional("max-output-tokens", self.max_output_tokens);
        print_optional("temperature", self.temperature);
        print_optional("reasoning-effort", self.reasoning_effort.as_deref());
        print_optional("reasoning-summary", self.reasoning_summary.as_deref());
        println!(
            "  web-search: {}",
            format_bool(self.web_search.unwrap_or(true))
        );
        print_optional("proxy-url", self.proxy_url.as_deref());
        match &self.system_prompt {
            Some(prompt) => {
                let first_line = prompt.lines().next().unwrap_or_default();
                println!("  system-prompt: {first_line}…");
            }
            None => println!("  system-prompt: (built-in)"),
        }
    }
}
