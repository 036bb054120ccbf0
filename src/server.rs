use crate::{
    config::AppConfig,
    handler::participant::handle_participant,
    model::{countdown::Countdown, session::QuizSession},
    persistence::ResultsStore,
    question_bank::QuestionBank,
};
use log::*;
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::{Mutex, mpsc},
    task::AbortHandle,
};
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error, Message, Result},
};

pub type Tx = mpsc::UnboundedSender<Message>;
pub type Rx = mpsc::UnboundedReceiver<Message>;

/// Process-wide, read-only dependencies shared by every connection.
pub struct AppState {
    pub config: AppConfig,
    pub bank: Arc<QuestionBank>,
    pub store: Arc<dyn ResultsStore>,
}

impl AppState {
    pub fn new(config: AppConfig, bank: Arc<QuestionBank>, store: Arc<dyn ResultsStore>) -> Self {
        Self {
            config,
            bank,
            store,
        }
    }
}

/// One participant's quiz attempt: the session, its countdown, and the
/// channel back to the participant's socket. Owned by a single connection.
pub struct Attempt {
    pub session: QuizSession,
    pub countdown: Countdown,
    pub tx: Tx,
    pub timer_abort_handle: Option<AbortHandle>,
    /// A valid StartQuiz has been accepted since the last restart.
    pub started: bool,
    /// Set once the completed result has been handed to the store, so a
    /// session is written at most once.
    pub result_submitted: bool,
}

pub type SharedAttempt = Arc<Mutex<Attempt>>;

impl Attempt {
    pub fn new(app_state: &AppState, tx: Tx) -> Self {
        Self {
            session: QuizSession::new(app_state.bank.clone()),
            countdown: Countdown::new(app_state.config.timer_initial_seconds),
            tx,
            timer_abort_handle: None,
            started: false,
            result_submitted: false,
        }
    }
}

async fn accept_connection(peer: SocketAddr, stream: TcpStream, app_state: Arc<AppState>) {
    if let Err(e) = handle_connection(peer, stream, app_state).await {
        match e {
            Error::ConnectionClosed | Error::Protocol(_) => (),
            err => error!("Error processing connection: {err}"),
        }
    }
}

async fn handle_connection(
    peer: SocketAddr,
    stream: TcpStream,
    app_state: Arc<AppState>,
) -> Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New quiz connection: {peer}");

    let (tx, rx) = mpsc::unbounded_channel::<Message>();
    let attempt: SharedAttempt = Arc::new(Mutex::new(Attempt::new(&app_state, tx)));
    handle_participant(ws_stream, app_state, attempt, rx).await;

    info!("Quiz connection closed: {peer}");
    Ok(())
}

pub async fn start_ws_server(listener: TcpListener, app_state: Arc<AppState>) {
    let addr = listener.local_addr().expect("Failed to get local address");
    info!("Listening on: {addr}");

    while let Ok((stream, _)) = listener.accept().await {
        let peer = stream
            .peer_addr()
            .expect("connected streams should have a peer address");
        info!("Peer address: {peer}");

        tokio::spawn(accept_connection(peer, stream, app_state.clone()));
    }
}
