//! Dispatcher: the per-datagram decision procedure.
//!
//! [`Dispatcher::handle`] takes one raw datagram plus its sender and returns
//! the [`Action`]s the network layer must perform.  It never touches a
//! socket, so every rule below is unit-testable.
//!
//! # Decision order
//!
//! ```text
//! decode ──malformed──────────────────────────► error "Invalid message format"
//!   │
//!   ├─ auth ──wrong/missing/non-text code─────► error "Invalid connection code"
//!   │     └──valid──► single-session policy ──► auth_response | error
//!   │
//!   ├─ sender not authenticated
//!   │     ├─ disconnect ──────────────────────► (nothing)
//!   │     └─ anything else, unknown types too ► error "Unauthorized"
//!   │
//!   └─ sender authenticated: refresh activity, then
//!         ├─ unknown / reply-only type ───────► error "Unknown message type: …"
//!         ├─ mouse_move_relative ─────────────► (nothing; failures only logged)
//!         ├─ mouse_click, keyboard ───────────► (nothing) | error "Command execution failed: …"
//!         ├─ keepalive ───────────────────────► keepalive_response
//!         ├─ request_frame ───────────────────► CaptureFrame
//!         └─ disconnect ──────────────────────► session removed
//! ```

use std::net::SocketAddr;
use std::time::Instant;

use remote_core::protocol::messages::error_text;
use remote_core::{
    decode_client_message, AuthGrant, ClientMessage, MessageKind, PairingSecret, ProtocolError,
    ServerMessage, SessionError, SessionPolicy, SessionStore,
};
use tracing::{debug, error, info, warn};

use super::inject_input::{InjectInputUseCase, InjectionError};

/// Something the network layer must do as a result of a datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send `message` to `to`.  Always best-effort.
    Send {
        to: SocketAddr,
        message: ServerMessage,
    },
    /// Capture a frame off the event loop and send it to `for_endpoint` if it
    /// is still authenticated when the frame is ready.
    CaptureFrame { for_endpoint: SocketAddr },
}

impl Action {
    fn reply(to: SocketAddr, message: ServerMessage) -> Vec<Action> {
        vec![Action::Send { to, message }]
    }

    fn error(to: SocketAddr, text: impl Into<String>) -> Vec<Action> {
        Self::reply(to, ServerMessage::error(text))
    }
}

/// Routes decoded datagrams against the session store and the input use case.
pub struct Dispatcher {
    secret: PairingSecret,
    sessions: SessionStore,
    input: InjectInputUseCase,
}

impl Dispatcher {
    pub fn new(secret: PairingSecret, policy: SessionPolicy, input: InjectInputUseCase) -> Self {
        Self {
            secret,
            sessions: SessionStore::new(policy),
            input,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionStore {
        &mut self.sessions
    }

    pub fn is_authenticated(&self, endpoint: &SocketAddr) -> bool {
        self.sessions.is_authenticated(endpoint)
    }

    pub fn input(&self) -> &InjectInputUseCase {
        &self.input
    }

    /// Handles one datagram from `sender` received at `now`.
    ///
    /// Never panics and never fails: every problem becomes either an `error`
    /// reply or a log line.
    pub fn handle(&mut self, datagram: &[u8], sender: SocketAddr, now: Instant) -> Vec<Action> {
        let authenticated = self.sessions.is_authenticated(&sender);

        match decode_client_message(datagram) {
            Err(ProtocolError::Malformed(reason)) => {
                debug!(%sender, %reason, "malformed datagram");
                Action::error(sender, error_text::INVALID_FORMAT)
            }
            Err(err) if !authenticated => {
                debug!(%sender, %err, "rejected undecodable datagram from unauthenticated sender");
                Action::error(sender, error_text::UNAUTHORIZED)
            }
            Err(err) => {
                self.sessions.touch(&sender, now);
                let kind = err.type_name().unwrap_or("unknown").to_string();
                debug!(%sender, %kind, "unknown message type");
                Action::error(sender, format!("Unknown message type: {kind}"))
            }
            Ok(ClientMessage::Auth { code }) => self.handle_auth(code.as_deref(), sender, now),
            Ok(ClientMessage::Disconnect) if !authenticated => {
                debug!(%sender, "disconnect from unauthenticated sender ignored");
                Vec::new()
            }
            Ok(msg) if !authenticated => {
                debug!(%sender, kind = %msg.kind(), "unauthorized message");
                Action::error(sender, error_text::UNAUTHORIZED)
            }
            Ok(msg) => {
                self.sessions.touch(&sender, now);
                self.route(msg, sender)
            }
        }
    }

    /// Removes every session and returns a shutdown notice for each.
    pub fn shutdown(&mut self) -> Vec<Action> {
        self.sessions
            .drain()
            .into_iter()
            .map(|session| Action::Send {
                to: session.endpoint,
                message: ServerMessage::error(error_text::SHUTTING_DOWN),
            })
            .collect()
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn handle_auth(&mut self, code: Option<&str>, sender: SocketAddr, now: Instant) -> Vec<Action> {
        if !code.is_some_and(|c| self.secret.matches(c)) {
            // A wrong code from an authenticated endpoint still counts as
            // activity and leaves its session in place.
            self.sessions.touch(&sender, now);
            warn!(%sender, "rejected auth: invalid connection code");
            return Action::error(sender, error_text::INVALID_CODE);
        }

        match self.sessions.authenticate(sender, now) {
            Ok(AuthGrant::Created) => {
                info!(%sender, "client authenticated");
                self.input.reset();
                Action::reply(sender, ServerMessage::auth_success())
            }
            Ok(AuthGrant::Refreshed) => {
                debug!(%sender, "client re-authenticated");
                Action::reply(sender, ServerMessage::auth_success())
            }
            Ok(AuthGrant::Replaced { previous }) => {
                info!(%sender, ?previous, "client authenticated, replacing previous session");
                self.input.reset();
                previous
                    .into_iter()
                    .map(|old| Action::Send {
                        to: old,
                        message: ServerMessage::error(error_text::SESSION_TAKEN_OVER),
                    })
                    .chain(Action::reply(sender, ServerMessage::auth_success()))
                    .collect()
            }
            Err(SessionError::SlotTaken { holder }) => {
                warn!(%sender, %holder, "rejected auth: another client is connected");
                Action::error(sender, error_text::SLOT_TAKEN)
            }
        }
    }

    fn route(&mut self, msg: ClientMessage, sender: SocketAddr) -> Vec<Action> {
        match msg {
            ClientMessage::MouseMoveRelative { dx, dy } => {
                if let Err(e) = self.input.handle_relative_move(dx, dy) {
                    warn!(%sender, "pointer move dropped: {e}");
                }
                Vec::new()
            }
            ClientMessage::MouseClick { click_type } => {
                debug!(%sender, click = click_type.as_str(), "click");
                let result = self.input.handle_click(click_type);
                command_outcome(sender, MessageKind::MouseClick, result)
            }
            ClientMessage::Keyboard { key } => {
                debug!(%sender, %key, "key press");
                let result = self.input.handle_key(&key).map(|_| ());
                command_outcome(sender, MessageKind::Keyboard, result)
            }
            ClientMessage::Keepalive => {
                Action::reply(sender, ServerMessage::keepalive_response())
            }
            ClientMessage::RequestFrame => vec![Action::CaptureFrame {
                for_endpoint: sender,
            }],
            ClientMessage::Disconnect => {
                self.sessions.remove(&sender);
                info!(%sender, "client disconnected");
                Vec::new()
            }
            // Auth never reaches routing; handled before the session gate.
            ClientMessage::Auth { .. } => Vec::new(),
        }
    }
}

fn command_outcome(
    sender: SocketAddr,
    operation: MessageKind,
    result: Result<(), InjectionError>,
) -> Vec<Action> {
    match result {
        Ok(()) => Vec::new(),
        Err(e) => {
            error!(%sender, %operation, "command failed: {e}");
            Action::error(sender, format!("Command execution failed: {operation}: {e}"))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::input_injection::mock::MockInputInjector;
    use remote_core::MotionConfig;
    use std::sync::Arc;
    use std::time::Duration;

    const CODE: &str = "K7Q2ZP";

    fn phone() -> SocketAddr {
        SocketAddr::from(([192, 168, 1, 31], 52000))
    }

    fn tablet() -> SocketAddr {
        SocketAddr::from(([192, 168, 1, 32], 52000))
    }

    fn dispatcher_with(policy: SessionPolicy) -> (Dispatcher, Arc<MockInputInjector>) {
        let injector = Arc::new(MockInputInjector::new());
        let input = InjectInputUseCase::new(injector.clone(), MotionConfig::default());
        let secret = PairingSecret::new(CODE).unwrap();
        (Dispatcher::new(secret, policy, input), injector)
    }

    fn error_texts(actions: &[Action]) -> Vec<(SocketAddr, String)> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Send {
                    to,
                    message: ServerMessage::Error { message, .. },
                } => Some((*to, message.clone())),
                _ => None,
            })
            .collect()
    }

    fn auth(d: &mut Dispatcher, from: SocketAddr, now: Instant) -> Vec<Action> {
        d.handle(
            format!(r#"{{"type":"auth","code":"{CODE}"}}"#).as_bytes(),
            from,
            now,
        )
    }

    #[test]
    fn test_malformed_datagram_gets_format_error() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);

        let actions = d.handle(b"{not json", phone(), Instant::now());

        assert_eq!(
            error_texts(&actions),
            vec![(phone(), error_text::INVALID_FORMAT.to_string())]
        );
        assert!(d.sessions().is_empty());
    }

    #[test]
    fn test_valid_auth_replies_success_and_creates_session() {
        // Arrange
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);
        let now = Instant::now();

        // Act
        let actions = auth(&mut d, phone(), now);

        // Assert
        assert!(matches!(
            actions.as_slice(),
            [Action::Send {
                message: ServerMessage::AuthResponse { .. },
                ..
            }]
        ));
        assert!(d.is_authenticated(&phone()));
    }

    #[test]
    fn test_wrong_code_creates_no_session() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);

        let actions = d.handle(br#"{"type":"auth","code":"WRONG1"}"#, phone(), Instant::now());

        assert_eq!(
            error_texts(&actions),
            vec![(phone(), error_text::INVALID_CODE.to_string())]
        );
        assert!(d.sessions().is_empty());
    }

    #[test]
    fn test_missing_code_is_invalid() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);

        let actions = d.handle(br#"{"type":"auth"}"#, phone(), Instant::now());

        assert_eq!(error_texts(&actions)[0].1, error_text::INVALID_CODE);
    }

    #[test]
    fn test_non_string_code_is_invalid_code_not_malformed() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);

        let actions = d.handle(br#"{"type":"auth","code":123}"#, phone(), Instant::now());

        assert_eq!(error_texts(&actions)[0].1, error_text::INVALID_CODE);
        assert!(d.sessions().is_empty());
    }

    #[test]
    fn test_command_before_auth_is_unauthorized_and_not_injected() {
        let (mut d, injector) = dispatcher_with(SessionPolicy::Reject);

        let actions = d.handle(br#"{"type":"mouse_click"}"#, phone(), Instant::now());

        assert_eq!(error_texts(&actions)[0].1, error_text::UNAUTHORIZED);
        assert!(injector.commands().is_empty());
    }

    #[test]
    fn test_unknown_type_before_auth_is_unauthorized() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);

        let actions = d.handle(br#"{"type":"scroll"}"#, phone(), Instant::now());

        assert_eq!(error_texts(&actions)[0].1, error_text::UNAUTHORIZED);
    }

    #[test]
    fn test_unknown_type_after_auth_names_the_type() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);
        auth(&mut d, phone(), Instant::now());

        let actions = d.handle(br#"{"type":"scroll"}"#, phone(), Instant::now());

        assert_eq!(error_texts(&actions)[0].1, "Unknown message type: scroll");
    }

    #[test]
    fn test_reply_kind_from_client_is_unknown_after_auth() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);
        auth(&mut d, phone(), Instant::now());

        let actions = d.handle(br#"{"type":"frame","data":""}"#, phone(), Instant::now());

        assert_eq!(error_texts(&actions)[0].1, "Unknown message type: frame");
    }

    #[test]
    fn test_disconnect_without_session_is_silent() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);

        let actions = d.handle(br#"{"type":"disconnect"}"#, phone(), Instant::now());

        assert!(actions.is_empty());
    }

    #[test]
    fn test_disconnect_removes_session() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);
        auth(&mut d, phone(), Instant::now());

        let actions = d.handle(br#"{"type":"disconnect"}"#, phone(), Instant::now());

        assert!(actions.is_empty());
        assert!(!d.is_authenticated(&phone()));
    }

    #[test]
    fn test_keepalive_refreshes_activity_and_replies() {
        // Arrange
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);
        let t0 = Instant::now();
        auth(&mut d, phone(), t0);
        let t1 = t0 + Duration::from_secs(90);

        // Act
        let actions = d.handle(br#"{"type":"keepalive"}"#, phone(), t1);

        // Assert
        assert!(matches!(
            actions.as_slice(),
            [Action::Send {
                message: ServerMessage::KeepaliveResponse { .. },
                ..
            }]
        ));
        assert_eq!(d.sessions().get(&phone()).unwrap().last_activity_at, t1);
    }

    #[test]
    fn test_request_frame_yields_capture_action_only_when_authenticated() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);
        let before = d.handle(br#"{"type":"request_frame"}"#, phone(), Instant::now());
        assert_eq!(error_texts(&before)[0].1, error_text::UNAUTHORIZED);

        auth(&mut d, phone(), Instant::now());
        let after = d.handle(br#"{"type":"request_frame"}"#, phone(), Instant::now());

        assert_eq!(
            after,
            vec![Action::CaptureFrame {
                for_endpoint: phone()
            }]
        );
    }

    #[test]
    fn test_wrong_code_from_authenticated_endpoint_keeps_session() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);
        auth(&mut d, phone(), Instant::now());

        let actions = d.handle(br#"{"type":"auth","code":"NOPE00"}"#, phone(), Instant::now());

        assert_eq!(error_texts(&actions)[0].1, error_text::INVALID_CODE);
        assert!(d.is_authenticated(&phone()));
    }

    #[test]
    fn test_reject_policy_refuses_second_client() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);
        auth(&mut d, phone(), Instant::now());

        let actions = auth(&mut d, tablet(), Instant::now());

        assert_eq!(
            error_texts(&actions),
            vec![(tablet(), error_text::SLOT_TAKEN.to_string())]
        );
        assert!(d.is_authenticated(&phone()));
        assert!(!d.is_authenticated(&tablet()));
    }

    #[test]
    fn test_replace_policy_notifies_displaced_client() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Replace);
        auth(&mut d, phone(), Instant::now());

        let actions = auth(&mut d, tablet(), Instant::now());

        assert_eq!(
            error_texts(&actions),
            vec![(phone(), error_text::SESSION_TAKEN_OVER.to_string())]
        );
        assert!(actions.iter().any(|a| matches!(
            a,
            Action::Send { to, message: ServerMessage::AuthResponse { .. } } if *to == tablet()
        )));
        assert!(!d.is_authenticated(&phone()));
        assert!(d.is_authenticated(&tablet()));
    }

    #[test]
    fn test_failed_click_reports_operation_and_keeps_session() {
        // Arrange
        let injector = Arc::new(MockInputInjector::failing());
        let input = InjectInputUseCase::new(injector, MotionConfig::default());
        let mut d = Dispatcher::new(
            PairingSecret::new(CODE).unwrap(),
            SessionPolicy::Reject,
            input,
        );
        auth(&mut d, phone(), Instant::now());

        // Act
        let actions = d.handle(br#"{"type":"mouse_click"}"#, phone(), Instant::now());

        // Assert
        let (_, text) = &error_texts(&actions)[0];
        assert!(
            text.starts_with("Command execution failed: mouse_click: "),
            "got {text:?}"
        );
        assert!(d.is_authenticated(&phone()));
    }

    #[test]
    fn test_failed_motion_is_silent() {
        let injector = Arc::new(MockInputInjector::failing());
        let input = InjectInputUseCase::new(injector, MotionConfig::default());
        let mut d = Dispatcher::new(
            PairingSecret::new(CODE).unwrap(),
            SessionPolicy::Reject,
            input,
        );
        auth(&mut d, phone(), Instant::now());

        let actions = d.handle(
            br#"{"type":"mouse_move_relative","dx":5.0,"dy":0}"#,
            phone(),
            Instant::now(),
        );

        assert!(actions.is_empty());
    }

    #[test]
    fn test_unknown_key_reports_keyboard_failure() {
        let (mut d, injector) = dispatcher_with(SessionPolicy::Reject);
        auth(&mut d, phone(), Instant::now());

        let actions = d.handle(br#"{"type":"keyboard","key":"warp"}"#, phone(), Instant::now());

        assert!(error_texts(&actions)[0]
            .1
            .starts_with("Command execution failed: keyboard: "));
        assert!(injector.commands().is_empty());
    }

    #[test]
    fn test_shutdown_notifies_and_clears() {
        let (mut d, _) = dispatcher_with(SessionPolicy::Reject);
        auth(&mut d, phone(), Instant::now());

        let actions = d.shutdown();

        assert_eq!(
            error_texts(&actions),
            vec![(phone(), error_text::SHUTTING_DOWN.to_string())]
        );
        assert!(d.sessions().is_empty());
    }
}
