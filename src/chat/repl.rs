//! Read–eval–print loop for the interactive chat.

use super::commands::{SlashCommand, help_text};
use super::session::Session;
use super::{ChatSettings, DEFAULT_SAVE_PATH};
use crate::error::{Error, Result};
use crate::output::Renderer;
use crate::provider::{ChatRequest, Fallback, GatewayClient};
use crate::transcript::{Metadata, Transcript};
use futures::StreamExt;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;
use tokio::sync::mpsc;

/// Lines read from the user, in order.
pub type InputLines = mpsc::Receiver<io::Result<String>>;

/// Read `input` line by line on a dedicated thread.
///
/// A blocking read cannot be cancelled, so it runs off the runtime and the
/// loop can race each line against Ctrl-C. The thread stops at end of input,
/// on a read error, or once the receiver is dropped.
pub fn spawn_line_reader<R: BufRead + Send + 'static>(input: R) -> InputLines {
    let (tx, rx) = mpsc::channel(16);
    thread::spawn(move || {
        for line in input.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// Interactive chat state for one run.
pub struct Repl<'a, O: Write, E: Write> {
    client: &'a GatewayClient,
    settings: ChatSettings,
    session: Session,
    model: String,
    stream: bool,
    save_path: Option<PathBuf>,
    auto_save: bool,
    renderer: Renderer<O, E>,
}

impl<'a, O: Write, E: Write> Repl<'a, O, E> {
    pub fn new(
        client: &'a GatewayClient,
        model: impl Into<String>,
        settings: ChatSettings,
        renderer: Renderer<O, E>,
    ) -> Self {
        Self {
            client,
            session: Session::new(&settings.system_prompt),
            model: model.into(),
            stream: settings.stream,
            save_path: settings.save_path.clone(),
            auto_save: settings.save_path.is_some(),
            settings,
            renderer,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn streaming(&self) -> bool {
        self.stream
    }

    pub fn into_renderer(self) -> Renderer<O, E> {
        self.renderer
    }

    /// Run until `/exit`, end of input, or Ctrl-C at the prompt.
    ///
    /// Request failures are reported and the loop continues; only input,
    /// output and auto-save failures end it with an error.
    pub async fn run(&mut self, mut lines: InputLines) -> Result<()> {
        self.renderer
            .info("Interactive chat started. Type /help for commands.")?;

        loop {
            self.renderer.prompt()?;

            let next = tokio::select! {
                line = lines.recv() => Some(line),
                _ = tokio::signal::ctrl_c() => None,
            };

            let line = match next {
                Some(Some(Ok(line))) => line,
                Some(Some(Err(e))) => return Err(Error::Input(e)),
                Some(None) => {
                    self.renderer.info("Input closed. Exiting chat.")?;
                    break;
                }
                None => {
                    self.renderer.newline()?;
                    self.renderer.info("Interrupt received. Exiting chat.")?;
                    break;
                }
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if input.starts_with('/') {
                match self.handle_command(input) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e @ Error::Io(_)) => return Err(e),
                    Err(e) => self.renderer.error(&e.user_message(Fallback::Plain))?,
                }
                continue;
            }

            self.send(input).await?;
        }

        if self.auto_save
            && let Some(path) = self.save_path.clone()
        {
            self.save_transcript(&path)?;
            self.renderer
                .info(&format!("History saved to {}", path.display()))?;
        }

        Ok(())
    }

    /// Returns `true` when the loop should stop.
    fn handle_command(&mut self, input: &str) -> Result<bool> {
        match SlashCommand::parse(input)? {
            SlashCommand::Help => self.renderer.plain(help_text())?,
            SlashCommand::Model(model) => {
                self.model = model.trim().to_string();
                self.renderer
                    .info(&format!("Model set to {}", self.model))?;
            }
            SlashCommand::Stream(enabled) => {
                self.stream = enabled;
                self.renderer
                    .info(&format!("Streaming set to {enabled}"))?;
            }
            SlashCommand::Reset => {
                self.session.reset();
                self.renderer.info("Conversation reset.")?;
            }
            SlashCommand::Save(path) => {
                let path = path
                    .map(PathBuf::from)
                    .or_else(|| self.save_path.clone())
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_PATH));
                self.save_transcript(&path)?;
                self.renderer
                    .info(&format!("History saved to {}", path.display()))?;
                self.save_path = Some(path);
            }
            SlashCommand::Exit => {
                self.renderer.info("Exiting chat.")?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn send(&mut self, input: &str) -> Result<()> {
        self.session.add_user(input);
        self.renderer.assistant_prefix()?;

        let request = ChatRequest::new(self.model.clone(), self.session.messages().to_vec())
            .with_temperature(self.settings.temperature);

        let outcome = tokio::select! {
            result = complete_turn(self.client, request, self.stream, &mut self.renderer) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        let result = match outcome {
            Some(result) => result,
            None => {
                self.renderer
                    .info("Interrupt received. Canceling generation...")?;
                Err(Error::Cancelled)
            }
        };

        match result {
            Ok(answer) => {
                if self.stream {
                    self.renderer.newline()?;
                } else {
                    self.renderer.plain(&answer)?;
                }
                self.session.add_assistant(&answer);
            }
            Err(e @ Error::Io(_)) => return Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "chat turn failed");
                self.session.remove_last_user_message();
                self.renderer.newline()?;
                self.renderer.error(&e.user_message(Fallback::Plain))?;
            }
        }

        Ok(())
    }

    fn save_transcript(&self, path: &Path) -> Result<()> {
        let transcript = Transcript::new(
            Metadata {
                model: self.model.clone(),
                base_url: self.client.base_url().to_string(),
                streaming: self.stream,
                temperature: self.settings.temperature,
                system_prompt: self.session.system_prompt().to_string(),
            },
            self.session.messages().to_vec(),
        );
        transcript.save(path)?;
        Ok(())
    }
}

/// Send one conversation and return the trimmed answer.
///
/// When streaming, tokens are rendered as they arrive.
pub async fn complete_turn<O: Write, E: Write>(
    client: &GatewayClient,
    mut request: ChatRequest,
    stream: bool,
    renderer: &mut Renderer<O, E>,
) -> Result<String> {
    request
        .messages
        .retain(|message| !message.content.trim().is_empty());
    if request.messages.is_empty() {
        return Err(Error::NoMessages);
    }

    if stream {
        let mut chunks = client.stream(request).await?;
        let mut answer = String::new();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if let Some(token) = chunk.first_delta() {
                answer.push_str(token);
                renderer.token(token)?;
            }
        }

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::EmptyResponse(
                "received a streaming response with empty content",
            ));
        }
        return Ok(answer.to_string());
    }

    let response = client.complete(request).await?;
    let choice = response
        .choices
        .first()
        .ok_or(Error::EmptyResponse("received a response with no choices"))?;
    let content = choice
        .message
        .as_ref()
        .and_then(|message| message.content.as_deref())
        .unwrap_or_default()
        .trim();
    if content.is_empty() {
        return Err(Error::EmptyResponse(
            "received a response with empty message content",
        ));
    }

    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::DEFAULT_TEMPERATURE;
    use crate::provider::Role;
    use std::io::Cursor;

    // Never contacted: these tests only exercise commands.
    fn offline_client() -> GatewayClient {
        GatewayClient::with_base_url("test-key", "http://127.0.0.1:9")
    }

    fn settings(save_path: Option<PathBuf>) -> ChatSettings {
        ChatSettings {
            stream: true,
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: "Be brief.".into(),
            save_path,
        }
    }

    fn run_script<'a>(
        client: &'a GatewayClient,
        settings: ChatSettings,
        script: &str,
    ) -> (Repl<'a, Vec<u8>, Vec<u8>>, Result<()>) {
        let mut repl = Repl::new(client, "model-a", settings, Renderer::new(Vec::new(), Vec::new()));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let lines = spawn_line_reader(Cursor::new(script.to_string()));
        let result = runtime.block_on(repl.run(lines));
        (repl, result)
    }

    fn output(repl: Repl<'_, Vec<u8>, Vec<u8>>) -> (String, String) {
        let (out, err) = repl.into_renderer().into_inner();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn test_model_and_stream_commands() {
        let client = offline_client();
        let (repl, result) = run_script(&client, settings(None), "/model  model-b \n/stream off\n/exit\n");
        result.unwrap();
        assert_eq!(repl.model(), "model-b");
        assert!(!repl.streaming());

        let (out, err) = output(repl);
        assert!(out.contains("[info] Model set to model-b\n"));
        assert!(out.contains("[info] Streaming set to false\n"));
        assert!(out.contains("[info] Exiting chat.\n"));
        assert!(err.is_empty());
    }

    #[test]
    fn test_command_errors_do_not_stop_loop() {
        let client = offline_client();
        let (repl, result) = run_script(&client, settings(None), "/stream maybe\n/bogus\n\n/help\n");
        result.unwrap();

        let (out, err) = output(repl);
        assert!(err.contains("Error: usage: /stream on|off\n"));
        assert!(err.contains("Error: unknown command \"/bogus\". Use /help\n"));
        assert!(out.contains("Commands:"));
        assert!(out.ends_with("[info] Input closed. Exiting chat.\n"));
    }

    #[test]
    fn test_reset_keeps_only_system_prompt() {
        let client = offline_client();
        let (repl, result) = run_script(&client, settings(None), "/reset\n");
        result.unwrap();
        let messages = repl.session().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "Be brief.");
    }

    #[test]
    fn test_save_command_writes_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/history.json");
        let client = offline_client();
        let script = format!("/save {}\n/exit\n", path.display());

        let (repl, result) = run_script(&client, settings(None), &script);
        result.unwrap();

        let transcript = Transcript::load(&path).unwrap();
        assert_eq!(transcript.meta.model, "model-a");
        assert_eq!(transcript.meta.system_prompt, "Be brief.");
        assert_eq!(transcript.messages.len(), 1);

        let (out, _) = output(repl);
        assert!(out.contains(&format!("[info] History saved to {}\n", path.display())));
    }

    #[test]
    fn test_auto_save_on_exit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto.json");
        let client = offline_client();

        let (repl, result) = run_script(&client, settings(Some(path.clone())), "/stream off\n");
        result.unwrap();

        let transcript = Transcript::load(&path).unwrap();
        assert!(!transcript.meta.streaming);
        let (out, _) = output(repl);
        assert!(out.ends_with(&format!("[info] History saved to {}\n", path.display())));
    }

    #[test]
    fn test_save_without_path_reuses_save_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let client = offline_client();

        let (repl, result) = run_script(&client, settings(Some(path.clone())), "/reset\n/save\n/exit\n");
        result.unwrap();

        assert!(Transcript::load(&path).is_ok());
        let (out, _) = output(repl);
        let saved = format!("[info] History saved to {}\n", path.display());
        // once for /save, once for the auto-save on exit
        assert_eq!(out.matches(&saved).count(), 2);
    }

    #[test]
    fn test_save_path_from_command_used_for_auto_save() {
        let dir = tempfile::tempdir().unwrap();
        let flag_path = dir.path().join("flag.json");
        let command_path = dir.path().join("command.json");
        let client = offline_client();
        let script = format!("/save {}\n/model model-b\n/exit\n", command_path.display());

        let (_repl, result) = run_script(&client, settings(Some(flag_path.clone())), &script);
        result.unwrap();

        assert!(!flag_path.exists());
        let transcript = Transcript::load(&command_path).unwrap();
        assert_eq!(transcript.meta.model, "model-b");
    }

    #[test]
    fn test_no_auto_save_without_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let client = offline_client();
        let script = format!("/save {}\n/model model-b\n/exit\n", path.display());

        let (repl, result) = run_script(&client, settings(None), &script);
        result.unwrap();

        // Only the explicit /save wrote; exiting did not save again.
        let transcript = Transcript::load(&path).unwrap();
        assert_eq!(transcript.meta.model, "model-a");
        let (out, _) = output(repl);
        assert_eq!(out.matches("History saved to").count(), 1);
    }

    #[test]
    fn test_line_reader_delivers_lines_then_closes() {
        let mut lines = spawn_line_reader(Cursor::new("one\n\ntwo"));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let received: Vec<String> = runtime.block_on(async {
            let mut received = Vec::new();
            while let Some(line) = lines.recv().await {
                received.push(line.unwrap());
            }
            received
        });
        assert_eq!(received, vec!["one", "", "two"]);
    }
}
