//! CLI argument parsing with clap.

use std::io::Read;

use clap::Parser;
use serde_json::{Map, Value};

/// Generate images through `OpenAI`, Gemini or `OpenRouter` with one tool call.
#[derive(Parser, Debug)]
#[command(name = "imagecast", version, about)]
pub struct Cli {
    /// Text prompt describing the desired image.
    #[arg(conflicts_with_all = ["prompt_file", "request"])]
    pub prompt: Option<String>,

    /// Path to a file containing the prompt text.
    #[arg(short = 'p', long, conflicts_with = "request")]
    pub prompt_file: Option<String>,

    /// Raw `generate_image` arguments as JSON; `-` reads stdin.
    #[arg(long, value_name = "FILE|-")]
    pub request: Option<String>,

    /// Provider alias from the config file or environment.
    #[arg(long, conflicts_with = "request")]
    pub provider: Option<String>,

    /// Model name or short alias (defaults to the alias model).
    #[arg(short, long, conflicts_with = "request")]
    pub model: Option<String>,

    /// Reference image: local png/jpg/jpeg/webp/gif path or data URL. Repeatable.
    #[arg(short, long = "image", conflicts_with = "request")]
    pub images: Vec<String>,

    /// Output directory.
    #[arg(long, conflicts_with = "request")]
    pub dir: Option<String>,

    /// Base filename without extension.
    #[arg(long, conflicts_with = "request")]
    pub filename: Option<String>,

    /// What to do when the output file exists.
    #[arg(long, value_parser = ["error", "overwrite", "suffix"], conflicts_with = "request")]
    pub overwrite: Option<String>,

    /// Provider parameter as key=value; values are parsed as JSON when possible. Repeatable.
    #[arg(long = "param", value_name = "KEY=VALUE", conflicts_with = "request")]
    pub params: Vec<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the prompt from either the positional argument or the file flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt file cannot be read.
    pub fn resolve_prompt(&self) -> Result<Option<String>, std::io::Error> {
        if let Some(ref text) = self.prompt {
            Ok(Some(text.clone()))
        } else if let Some(ref path) = self.prompt_file {
            std::fs::read_to_string(path).map(|text| Some(text.trim_end().to_string()))
        } else {
            Ok(None)
        }
    }

    /// Build the `generate_image` arguments from `--request` or the flags.
    ///
    /// # Errors
    ///
    /// Returns a message if a file cannot be read, the request is not JSON,
    /// or a `--param` is not `key=value`.
    pub fn tool_arguments(&self) -> Result<Value, String> {
        if let Some(ref source) = self.request {
            let text = if source == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf).map_err(|e| format!("Failed to read stdin: {e}"))?;
                buf
            } else {
                std::fs::read_to_string(source).map_err(|e| format!("Failed to read request {source}: {e}"))?
            };
            return serde_json::from_str(&text).map_err(|e| format!("Request is not valid JSON: {e}"));
        }

        let mut args = Map::new();
        insert_opt(&mut args, "provider", self.provider.clone());
        insert_opt(&mut args, "model", self.model.clone());
        let prompt = self.resolve_prompt().map_err(|e| format!("Failed to read prompt file: {e}"))?;
        insert_opt(&mut args, "prompt", prompt);
        if !self.images.is_empty() {
            args.insert("images".to_string(), self.images.clone().into());
        }

        let mut output = Map::new();
        insert_opt(&mut output, "dir", self.dir.clone());
        insert_opt(&mut output, "filename", self.filename.clone());
        insert_opt(&mut output, "overwrite", self.overwrite.clone());
        if !output.is_empty() {
            args.insert("output".to_string(), Value::Object(output));
        }

        if !self.params.is_empty() {
            let params = self.params.iter().map(String::as_str).map(parse_param).collect::<Result<Map<_, _>, _>>()?;
            args.insert("params".to_string(), Value::Object(params));
        }
        Ok(Value::Object(args))
    }
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value));
    }
}

/// `n=2` → `("n", 2)`, `size=1024x1024` → `("size", "1024x1024")`.
fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) =
        raw.split_once('=').ok_or_else(|| format!("Invalid --param '{raw}': expected key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Invalid --param '{raw}': empty key"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_prompt_and_provider() {
        let cli = Cli::parse_from(["imagecast", "--provider", "openai", "a cat"]);
        assert_eq!(cli.tool_arguments().unwrap(), serde_json::json!({"provider": "openai", "prompt": "a cat"}));
    }

    #[test]
    fn prompt_file_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "prompt from file\n").unwrap();

        let cli = Cli::parse_from(["imagecast", "-p", path.to_str().unwrap()]);
        assert!(cli.prompt.is_none());
        assert_eq!(cli.resolve_prompt().unwrap().as_deref(), Some("prompt from file"));
    }

    #[test]
    fn no_prompt_is_allowed_with_images() {
        let cli = Cli::parse_from(["imagecast", "--provider", "gemini", "-i", "a.png", "-i", "b.jpg"]);
        assert!(cli.resolve_prompt().unwrap().is_none());
        assert_eq!(
            cli.tool_arguments().unwrap(),
            serde_json::json!({"provider": "gemini", "images": ["a.png", "b.jpg"]})
        );
    }

    #[test]
    fn all_options() {
        let cli = Cli::parse_from([
            "imagecast",
            "--provider",
            "openai",
            "-m",
            "gpt-1",
            "--dir",
            "out",
            "--filename",
            "pic",
            "--overwrite",
            "error",
            "--param",
            "n=2",
            "--param",
            "size=1024x1024",
            "-v",
            "a landscape",
        ]);
        assert!(cli.verbose);
        assert_eq!(
            cli.tool_arguments().unwrap(),
            serde_json::json!({
                "provider": "openai",
                "model": "gpt-1",
                "prompt": "a landscape",
                "output": {"dir": "out", "filename": "pic", "overwrite": "error"},
                "params": {"n": 2, "size": "1024x1024"}
            })
        );
    }

    #[test]
    fn unknown_overwrite_policy_is_rejected() {
        assert!(Cli::try_parse_from(["imagecast", "--overwrite", "clobber", "x"]).is_err());
    }

    #[test]
    fn request_conflicts_with_flags() {
        assert!(Cli::try_parse_from(["imagecast", "--request", "r.json", "--provider", "openai"]).is_err());
    }

    #[test]
    fn request_file_is_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(&path, r#"{"provider": "gemini", "messages": [{"role": "user", "content": "hi"}]}"#).unwrap();

        let cli = Cli::parse_from(["imagecast", "--request", path.to_str().unwrap()]);
        let args = cli.tool_arguments().unwrap();
        assert_eq!(args["provider"], "gemini");
        assert_eq!(args["messages"][0]["content"], "hi");
    }

    #[test]
    fn malformed_params_and_requests_fail() {
        let cli = Cli::parse_from(["imagecast", "--param", "novalue", "x"]);
        assert!(cli.tool_arguments().unwrap_err().contains("expected key=value"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(&path, "{not json").unwrap();
        let cli = Cli::parse_from(["imagecast", "--request", path.to_str().unwrap()]);
        assert!(cli.tool_arguments().unwrap_err().contains("not valid JSON"));
    }
}
