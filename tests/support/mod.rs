#![allow(dead_code)]

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

pub const GREETING: &str = "Salve, seeker of wisdom.";
pub const PROMPT: &str = "Quaeris quid?";
pub const EMPTY_INPUT: &str = "Non audivi te.";
pub const FAREWELL: &str = "Vale.";
pub const SYSTEM_MESSAGE: &str = "You are a historian of Rome.";

#[derive(Debug)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Answers exactly one HTTP request with `status` and `body`, then returns what it received.
pub fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("address should be available");

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept should succeed");
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .expect("request line should be readable");

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("header should be readable");
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                headers.push((key.trim().to_string(), value.trim().to_string()));
            }
        }

        let content_length = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.parse::<usize>().ok())
            .unwrap_or(0);
        let mut raw_body = vec![0u8; content_length];
        reader
            .read_exact(&mut raw_body)
            .expect("body should be readable");

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = reader.into_inner();
        stream
            .write_all(response.as_bytes())
            .expect("response should be writable");
        stream.flush().expect("response should flush");

        CapturedRequest {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(raw_body).expect("body should be utf8"),
        }
    });

    (format!("http://{addr}/"), handle)
}

pub fn completion_body(reply: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-35-turbo",
        "choices": [
            {
                "message": {"role": "assistant", "content": reply},
                "finish_reason": "stop",
                "index": 0
            }
        ]
    })
    .to_string()
}

pub fn unique_temp_dir(suffix: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "azchat-{suffix}-{stamp}-{}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("failed to create temp directory");
    dir
}

/// Writes `messages.json` and `system_message.txt` into `dir`.
pub fn write_templates(dir: &Path) {
    let messages = serde_json::json!({
        "greeting": GREETING,
        "prompt": PROMPT,
        "emptyInput": EMPTY_INPUT,
        "exit": FAREWELL,
    });
    fs::write(dir.join("messages.json"), messages.to_string()).expect("write messages");
    fs::write(dir.join("system_message.txt"), SYSTEM_MESSAGE).expect("write system message");
}

/// A command for the binary with a clean environment rooted at `dir`.
pub fn azchat_command(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_azchat"));
    cmd.current_dir(dir)
        .env("CHAT_RESOURCE_DIR", dir)
        .env("RUST_LOG", "azchat=info")
        .env_remove("CHAT_CONFIG_SOURCE")
        .env_remove("LOG_FORMAT")
        .env_remove("LOG_OUTPUT")
        .env_remove("LOG_FILE_PATH");
    for key in [
        "OPENAI_URL",
        "OPENAI_KEY",
        "OPENAI_DEPLOYMENT",
        "HISTORY_LENGTH",
        "MAX_TOKENS",
        "TEMPERATURE",
        "TOP_P",
        "FREQUENCY_PENALTY",
        "PRESENCE_PENALTY",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

/// Configures `cmd` to read endpoint settings from the environment.
pub fn with_env_config(cmd: &mut Command, base_url: &str) {
    cmd.env("CHAT_CONFIG_SOURCE", "env")
        .env("OPENAI_URL", base_url)
        .env("OPENAI_KEY", "test-key")
        .env("OPENAI_DEPLOYMENT", "historian");
}

pub fn run_with_stdin(mut cmd: Command, stdin: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run azchat binary");
    // The binary may exit before reading stdin when startup fails.
    let _ = child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin.as_bytes());
    child.wait_with_output().expect("failed to wait for azchat")
}
