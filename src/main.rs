mod api;
mod config;

use anyhow::Result;
use api::ApiClient;
use config::Config;
use log::LevelFilter;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

fn print_usage() {
    println!("🤖 Gemini CLI");
    println!("Usage: gemini-ask 'your question here'");
    println!("Example: gemini-ask 'Explain quantum computing'");
}

fn print_missing_key_help() {
    println!("❌ No Gemini API key found!");
    println!("Please either:");
    println!("1. Set {} environment variable", config::KEY_ENV_VAR);
    println!("2. Update {} with your API key", config::CONFIG_FILE);
    println!("3. Get your API key from: https://makersuite.google.com/app/apikey");
}

#[tokio::main]
async fn main() {
    let config = Config::from_cli();

    let filter = if config.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = TermLogger::init(
        filter,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    if config.prompt_words.is_empty() {
        print_usage();
        return;
    }
    let prompt = config.prompt();

    println!("🤖 Initializing Gemini...");
    let api_key = match config::resolve_api_key() {
        Some(key) => key,
        None => {
            print_missing_key_help();
            return;
        }
    };
    let api_client = ApiClient::new(api_key);

    println!("💭 Asking: {}", prompt);
    println!("🤖 Gemini is thinking...");

    // A failed call is reported in place of the response; errors are
    // printed, never signaled through the exit status.
    println!("{}", render_outcome(api_client.generate(&prompt).await));
}

/// Renders the final output block: the response text verbatim on success, or
/// the error's description substituted for it.
fn render_outcome(result: Result<String>) -> String {
    match result {
        Ok(text) => format!("\n✨ Response:\n{}", text),
        Err(e) => format!("\n✨ Response:\n❌ Error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn successful_outcome_passes_the_response_text_through_unmodified() {
        let rendered = render_outcome(Ok("Quantum computing is a field.".to_string()));
        assert_eq!(rendered, "\n✨ Response:\nQuantum computing is a field.");
    }

    #[test]
    fn failed_outcome_substitutes_a_prefixed_error_string() {
        let rendered = render_outcome(Err(anyhow!("API request failed with code 429")));
        assert_eq!(
            rendered,
            "\n✨ Response:\n❌ Error: API request failed with code 429"
        );
    }
}
