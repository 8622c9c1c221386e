// [libs/infra/replication/src/wire.rs]
/*!
 * =================================================================
 * APARATO: REPLICATION WIRE SESSION (V8.0 - COPY BOTH)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: SESIÓN replication=database SOBRE TCP CRUDO
 *
 * VISION HIPER-HOLÍSTICA:
 * El driver de pool no habla el sub-protocolo de replicación, así que
 * esta sesión arma el startup packet con 'replication=database' a
 * mano sobre postgres-protocol: autenticación (cleartext, MD5,
 * SCRAM-SHA-256), consultas simples para la fase de preparación y el
 * flujo COPY BOTH bidireccional para el streaming del WAL.
 * =================================================================
 */

use bytes::{Buf, BytesMut};
use fallible_iterator::FallibleIterator;
use postgres_protocol::authentication;
use postgres_protocol::authentication::sasl::{ChannelBinding, ScramSha256};
use postgres_protocol::message::backend::Message;
use postgres_protocol::message::frontend;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

use crate::errors::ReplicationError;

/// Capacidad inicial del buffer de lectura del socket.
const READ_BUFFER_CAPACITY: usize = 64 * 1024;

/// Coordenadas de la sesión de replicación.
#[derive(Debug, Clone)]
pub struct WireConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub application_name: String,
}

/// Evento observado dentro del flujo COPY BOTH.
#[derive(Debug)]
pub enum CopyEvent {
    /// Payload de replicación ('k' o 'w') listo para el decodificador.
    Data(Vec<u8>),
    /// El servidor cerró el flujo ordenadamente.
    Done,
}

pub struct ReplicationWireSession {
    stream: TcpStream,
    read_buffer: BytesMut,
    write_buffer: BytesMut,
}

impl ReplicationWireSession {
    /// Abre la sesión: TCP, startup con `replication=database` y
    /// negociación de autenticación hasta ReadyForQuery.
    #[instrument(skip(config), fields(host = %config.host, database = %config.database))]
    pub async fn connect(config: &WireConfig) -> Result<Self, ReplicationError> {
        let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
        stream.set_nodelay(true)?;

        let mut session = Self {
            stream,
            read_buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            write_buffer: BytesMut::new(),
        };

        // Startup packet: la llave 'replication=database' conmuta el
        // backend al sub-protocolo de replicación lógica.
        let startup_parameters = [
            ("user", config.user.as_str()),
            ("database", config.database.as_str()),
            ("replication", "database"),
            ("application_name", config.application_name.as_str()),
        ];
        frontend::startup_message(startup_parameters, &mut session.write_buffer)?;
        session.flush_write_buffer().await?;

        session.negotiate_authentication(config).await?;

        info!("🛰️  [REPL_SESSION]: Replication session established against [{}].", config.host);
        Ok(session)
    }

    /// Resuelve el desafío de autenticación del backend.
    async fn negotiate_authentication(&mut self, config: &WireConfig) -> Result<(), ReplicationError> {
        loop {
            match self.next_backend_message().await? {
                Message::AuthenticationOk => {}

                Message::AuthenticationCleartextPassword => {
                    let password = required_password(config)?;
                    frontend::password_message(password.as_bytes(), &mut self.write_buffer)?;
                    self.flush_write_buffer().await?;
                }

                Message::AuthenticationMd5Password(body) => {
                    let password = required_password(config)?;
                    let digest = authentication::md5_hash(
                        config.user.as_bytes(),
                        password.as_bytes(),
                        body.salt(),
                    );
                    frontend::password_message(digest.as_bytes(), &mut self.write_buffer)?;
                    self.flush_write_buffer().await?;
                }

                Message::AuthenticationSasl(body) => {
                    let mechanisms: Vec<String> =
                        body.mechanisms().map(|mechanism| Ok(mechanism.to_string())).collect()?;
                    self.negotiate_scram(config, mechanisms).await?;
                }

                Message::ParameterStatus(_) | Message::BackendKeyData(_) | Message::NoticeResponse(_) => {}

                Message::ReadyForQuery(_) => return Ok(()),

                Message::ErrorResponse(body) => return Err(server_error(body)),

                unexpected => {
                    return Err(ReplicationError::Protocol(format!(
                        "unexpected message during authentication: {:?}",
                        message_tag(&unexpected)
                    )))
                }
            }
        }
    }

    /// Flujo SCRAM-SHA-256 completo (inicial, continue, final).
    async fn negotiate_scram(
        &mut self,
        config: &WireConfig,
        mechanisms: Vec<String>,
    ) -> Result<(), ReplicationError> {
        if !mechanisms.iter().any(|mechanism| mechanism == "SCRAM-SHA-256") {
            return Err(ReplicationError::Authentication(format!(
                "server offered unsupported SASL mechanisms: {mechanisms:?}"
            )));
        }

        let password = required_password(config)?;
        let mut scram = ScramSha256::new(password.as_bytes(), ChannelBinding::unsupported());

        frontend::sasl_initial_response("SCRAM-SHA-256", scram.message(), &mut self.write_buffer)?;
        self.flush_write_buffer().await?;

        loop {
            match self.next_backend_message().await? {
                Message::AuthenticationSaslContinue(body) => {
                    scram
                        .update(body.data())
                        .map_err(|fault| ReplicationError::Authentication(fault.to_string()))?;
                    frontend::sasl_response(scram.message(), &mut self.write_buffer)?;
                    self.flush_write_buffer().await?;
                }
                Message::AuthenticationSaslFinal(body) => {
                    scram
                        .finish(body.data())
                        .map_err(|fault| ReplicationError::Authentication(fault.to_string()))?;
                    return Ok(());
                }
                Message::ErrorResponse(body) => return Err(server_error(body)),
                unexpected => {
                    return Err(ReplicationError::Protocol(format!(
                        "unexpected message during SCRAM: {:?}",
                        message_tag(&unexpected)
                    )))
                }
            }
        }
    }

    /// Consulta simple; apta para la fase de preparación (pg_catalog,
    /// CREATE PUBLICATION, CREATE_REPLICATION_SLOT).
    #[instrument(skip(self))]
    pub async fn simple_query(&mut self, sql: &str) -> Result<Vec<Vec<Option<String>>>, ReplicationError> {
        frontend::query(sql, &mut self.write_buffer)?;
        self.flush_write_buffer().await?;

        let mut result_rows = Vec::new();

        loop {
            match self.next_backend_message().await? {
                Message::RowDescription(_) | Message::CommandComplete(_) | Message::EmptyQueryResponse => {}

                Message::DataRow(body) => {
                    let buffer = body.buffer();
                    let mut row_values = Vec::new();
                    let mut ranges = body.ranges();
                    while let Some(range) = ranges.next()? {
                        row_values.push(range.map(|range| {
                            String::from_utf8_lossy(&buffer[range]).into_owned()
                        }));
                    }
                    result_rows.push(row_values);
                }

                Message::NoticeResponse(_) | Message::ParameterStatus(_) => {}

                Message::ReadyForQuery(_) => return Ok(result_rows),

                Message::ErrorResponse(body) => {
                    let fault = server_error(body);
                    // El backend aún emitirá ReadyForQuery; lo drenamos
                    // para dejar la sesión coherente antes de reportar.
                    self.drain_until_ready().await?;
                    return Err(fault);
                }

                unexpected => {
                    return Err(ReplicationError::Protocol(format!(
                        "unexpected message during simple query: {:?}",
                        message_tag(&unexpected)
                    )))
                }
            }
        }
    }

    /// Emite START_REPLICATION y espera la apertura del flujo COPY BOTH.
    #[instrument(skip(self))]
    pub async fn start_copy_both(&mut self, sql: &str) -> Result<(), ReplicationError> {
        frontend::query(sql, &mut self.write_buffer)?;
        self.flush_write_buffer().await?;

        loop {
            match self.next_backend_message().await? {
                Message::CopyBothResponse(_) => {
                    debug!("🔁 [REPL_STREAM]: COPY BOTH channel open.");
                    return Ok(());
                }
                Message::NoticeResponse(_) | Message::ParameterStatus(_) => {}
                Message::ErrorResponse(body) => return Err(server_error(body)),
                unexpected => {
                    return Err(ReplicationError::Protocol(format!(
                        "unexpected message awaiting CopyBothResponse: {:?}",
                        message_tag(&unexpected)
                    )))
                }
            }
        }
    }

    /// Siguiente payload del flujo COPY BOTH, en orden estricto de WAL.
    pub async fn next_copy_payload(&mut self) -> Result<CopyEvent, ReplicationError> {
        loop {
            match self.next_backend_message().await? {
                Message::CopyData(body) => {
                    return Ok(CopyEvent::Data(body.into_bytes().to_vec()));
                }
                Message::CopyDone => return Ok(CopyEvent::Done),
                Message::NoticeResponse(_) | Message::ParameterStatus(_) => {}
                Message::ErrorResponse(body) => return Err(server_error(body)),
                unexpected => {
                    return Err(ReplicationError::Protocol(format!(
                        "unexpected message during streaming: {:?}",
                        message_tag(&unexpected)
                    )))
                }
            }
        }
    }

    /// Emite un payload (StandbyStatusUpdate) dentro del flujo COPY BOTH.
    pub async fn send_copy_data(&mut self, payload: &[u8]) -> Result<(), ReplicationError> {
        frontend::copy_data(payload, &mut self.write_buffer)?;
        self.flush_write_buffer().await?;
        Ok(())
    }

    async fn drain_until_ready(&mut self) -> Result<(), ReplicationError> {
        loop {
            if let Message::ReadyForQuery(_) = self.next_backend_message().await? {
                return Ok(());
            }
        }
    }

    /// Parsea el siguiente mensaje del backend, leyendo del socket
    /// cuantas veces haga falta para completar el marco.
    async fn next_backend_message(&mut self) -> Result<Message, ReplicationError> {
        loop {
            if let Some(message) = Message::parse(&mut self.read_buffer)? {
                return Ok(message);
            }

            let bytes_read = self.stream.read_buf(&mut self.read_buffer).await?;
            if bytes_read == 0 {
                warn!("🔌 [REPL_SESSION]: Server closed the replication socket.");
                return Err(ReplicationError::Disconnected);
            }
        }
    }

    async fn flush_write_buffer(&mut self) -> Result<(), ReplicationError> {
        self.stream.write_all(&self.write_buffer).await?;
        self.stream.flush().await?;
        self.write_buffer.advance(self.write_buffer.len());
        Ok(())
    }
}

fn required_password(config: &WireConfig) -> Result<&str, ReplicationError> {
    config
        .password
        .as_deref()
        .ok_or_else(|| ReplicationError::Authentication("server requested a password but none is configured".into()))
}

fn server_error(body: postgres_protocol::message::backend::ErrorResponseBody) -> ReplicationError {
    let mut code = String::from("XX000");
    let mut message = String::from("unknown server error");

    let mut fields = body.fields();
    while let Ok(Some(field)) = fields.next() {
        match field.type_() {
            b'C' => code = field.value().to_string(),
            b'M' => message = field.value().to_string(),
            _ => {}
        }
    }

    ReplicationError::Server { code, message }
}

/// Etiqueta diagnóstica de un mensaje inesperado.
fn message_tag(message: &Message) -> &'static str {
    match message {
        Message::AuthenticationOk => "AuthenticationOk",
        Message::BackendKeyData(_) => "BackendKeyData",
        Message::CommandComplete(_) => "CommandComplete",
        Message::CopyData(_) => "CopyData",
        Message::CopyDone => "CopyDone",
        Message::DataRow(_) => "DataRow",
        Message::EmptyQueryResponse => "EmptyQueryResponse",
        Message::ErrorResponse(_) => "ErrorResponse",
        Message::NoticeResponse(_) => "NoticeResponse",
        Message::ParameterStatus(_) => "ParameterStatus",
        Message::ReadyForQuery(_) => "ReadyForQuery",
        Message::RowDescription(_) => "RowDescription",
        _ => "Other",
    }
}
// FIN DEL ARCHIVO [libs/infra/replication/src/wire.rs]
