//! FTP session
//!
//! Wraps a blocking `suppaftp` control connection behind [`RemoteFs`].

use std::io::Read;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Mode};
use tracing::{debug, info};

use crate::core::config::FtpConfig;
use crate::core::{DeployError, RemoteError, Result};
use crate::deploy::credentials::Credentials;
use crate::deploy::remote::{RemoteFs, RemoteResult};

impl From<FtpError> for RemoteError {
    fn from(err: FtpError) -> Self {
        match err {
            FtpError::UnexpectedResponse(response) => RemoteError::rejected(
                response.status.code(),
                String::from_utf8_lossy(&response.body).trim().to_string(),
            ),
            other => RemoteError::Connection(other.to_string()),
        }
    }
}

/// Authenticated FTP session in passive, binary mode
pub struct FtpSession {
    stream: FtpStream,
    closed: bool,
}

impl FtpSession {
    /// Connect, log in, and switch to passive binary transfers
    pub fn connect(credentials: &Credentials, config: &FtpConfig) -> Result<Self> {
        let port = credentials.port.unwrap_or(config.port);
        let addr = resolve(&credentials.host, port)?;

        info!("Connecting to {} ({})", credentials.host, addr);
        let control = open_control(addr, config.connect_timeout())?;
        let mut stream = FtpStream::connect_with_stream(control).map_err(RemoteError::from)?;

        if let Err(e) = stream.login(credentials.username.as_str(), credentials.password.as_str()) {
            let err = RemoteError::from(e);
            let _ = stream.quit();
            return Err(if err.is_permanent() {
                DeployError::Auth(err.to_string())
            } else {
                err.into()
            });
        }
        info!("Logged in as {}", credentials.username);

        stream.set_mode(Mode::Passive);
        stream
            .transfer_type(FileType::Binary)
            .map_err(RemoteError::from)?;

        Ok(Self {
            stream,
            closed: false,
        })
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| RemoteError::Connection(format!("Cannot resolve FTP host '{}': {}", host, e)))?
        .next()
        .ok_or_else(|| RemoteError::Connection(format!("FTP host '{}' has no address", host)))?;
    Ok(addr)
}

/// Control connection whose connect and every read/write is bounded by `timeout`
fn open_control(addr: SocketAddr, timeout: Duration) -> Result<TcpStream> {
    let unreachable = |e: std::io::Error| RemoteError::Connection(format!("{}: {}", addr, e));

    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(unreachable)?;
    stream.set_read_timeout(Some(timeout)).map_err(unreachable)?;
    stream.set_write_timeout(Some(timeout)).map_err(unreachable)?;
    Ok(stream)
}

impl RemoteFs for FtpSession {
    fn pwd(&mut self) -> RemoteResult<String> {
        Ok(self.stream.pwd()?)
    }

    fn cwd(&mut self, path: &str) -> RemoteResult<()> {
        debug!("CWD {}", path);
        Ok(self.stream.cwd(path)?)
    }

    fn mkdir(&mut self, path: &str) -> RemoteResult<()> {
        debug!("MKD {}", path);
        Ok(self.stream.mkdir(path)?)
    }

    fn put(&mut self, path: &str, mut reader: &mut dyn Read) -> RemoteResult<u64> {
        debug!("STOR {}", path);
        Ok(self.stream.put_file(path, &mut reader)?)
    }

    fn remove(&mut self, path: &str) -> RemoteResult<()> {
        debug!("DELE {}", path);
        Ok(self.stream.rm(path)?)
    }

    fn close(&mut self) -> RemoteResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("QUIT");
        Ok(self.stream.quit()?)
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use std::time::Instant;

    /// Single-connection FTP server: greets with 220, then answers each
    /// command with `reply`. Returns the commands it received.
    fn scripted_server(reply: fn(&str) -> &'static str) -> (u16, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            writer.write_all(b"220 ready\r\n").unwrap();

            let mut received = Vec::new();
            for line in BufReader::new(stream).lines() {
                let Ok(line) = line else { break };
                let answer = reply(&line);
                received.push(line);
                if writer.write_all(answer.as_bytes()).is_err() {
                    break;
                }
            }
            received
        });

        (port, handle)
    }

    fn verb(command: &str) -> &str {
        command.split(' ').next().unwrap_or_default()
    }

    fn wrong_password(command: &str) -> &'static str {
        match verb(command) {
            "USER" => "331 Password required\r\n",
            "PASS" => "530 Login incorrect\r\n",
            "QUIT" => "221 Goodbye\r\n",
            _ => "502 Not implemented\r\n",
        }
    }

    fn accepting(command: &str) -> &'static str {
        match verb(command) {
            "USER" => "331 Password required\r\n",
            "PASS" => "230 Logged in\r\n",
            "TYPE" => "200 Type set to I\r\n",
            "QUIT" => "221 Goodbye\r\n",
            _ => "502 Not implemented\r\n",
        }
    }

    fn local(port: u16) -> Credentials {
        Credentials {
            host: "127.0.0.1".to_string(),
            username: "u123".to_string(),
            password: "secret".to_string(),
            port: Some(port),
        }
    }

    fn quits(received: &[String]) -> usize {
        received.iter().filter(|c| c.as_str() == "QUIT").count()
    }

    #[test]
    fn test_resolve_literal_address() {
        let addr = resolve("127.0.0.1", 2121).unwrap();
        assert_eq!(addr.port(), 2121);
    }

    #[test]
    fn test_unresolvable_host_is_a_connection_error() {
        let err = resolve("no-such-host.invalid", 21).unwrap_err();
        assert!(matches!(err, DeployError::Remote(RemoteError::Connection(_))));
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_rejected_login_is_auth_error_and_quits() {
        let (port, server) = scripted_server(wrong_password);

        let err = match FtpSession::connect(&local(port), &FtpConfig::default()) {
            Ok(_) => panic!("login should have been refused"),
            Err(e) => e,
        };
        assert!(matches!(err, DeployError::Auth(_)));
        assert!(err.to_string().contains("530") || err.to_string().contains("Login incorrect"));

        let received = server.join().unwrap();
        assert_eq!(received[0], "USER u123");
        assert_eq!(received[1], "PASS secret");
        assert_eq!(quits(&received), 1);
    }

    #[test]
    fn test_session_is_binary_and_quits_once_on_drop() {
        let (port, server) = scripted_server(accepting);

        let session = FtpSession::connect(&local(port), &FtpConfig::default()).unwrap();
        drop(session);

        let received = server.join().unwrap();
        assert!(received.iter().any(|c| c == "TYPE I"));
        assert_eq!(quits(&received), 1);
    }

    #[test]
    fn test_explicit_close_is_not_repeated_on_drop() {
        let (port, server) = scripted_server(accepting);

        let mut session = FtpSession::connect(&local(port), &FtpConfig::default()).unwrap();
        session.close().unwrap();
        session.close().unwrap();
        drop(session);

        assert_eq!(quits(&server.join().unwrap()), 1);
    }

    #[test]
    fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            // Accept, then never send the greeting
            let (_stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(5));
        });

        let config = FtpConfig {
            connect_timeout_secs: 1,
            ..FtpConfig::default()
        };
        let started = Instant::now();
        let result = FtpSession::connect(&local(port), &config);

        assert!(matches!(
            result,
            Err(DeployError::Remote(RemoteError::Connection(_)))
        ));
        assert!(started.elapsed() < Duration::from_secs(4));
        server.join().unwrap();
    }

    #[test]
    fn test_connection_errors_are_not_permanent() {
        let err = RemoteError::from(FtpError::BadResponse);
        assert!(matches!(err, RemoteError::Connection(_)));
        assert!(!err.is_permanent());
    }

    #[test]
    #[ignore] // Requires a reachable FTP server in SITEDEPLOY_TEST_FTP_HOST
    fn test_connect_to_live_server() {
        let host = std::env::var("SITEDEPLOY_TEST_FTP_HOST").unwrap();
        let credentials = Credentials {
            host,
            username: std::env::var("SITEDEPLOY_TEST_FTP_USER").unwrap_or_default(),
            password: std::env::var("SITEDEPLOY_TEST_FTP_PASS").unwrap_or_default(),
            port: None,
        };
        let mut session = FtpSession::connect(&credentials, &FtpConfig::default()).unwrap();
        assert!(session.pwd().unwrap().starts_with('/'));
        session.close().unwrap();
    }
}
