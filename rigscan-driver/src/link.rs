use crate::constants::{MAX_LINE_BYTES, SERIAL_TIMEOUT_MS};
use crate::error::RigError;
use serialport::SerialPort;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Non-blocking, line-oriented duplex channel to one device.
pub trait Link {
    /// Sends one line. The link appends the line terminator.
    fn send(&mut self, line: &str) -> Result<(), RigError>;

    /// Returns the next complete line, if one has arrived, without blocking.
    /// Lines are trimmed and empty lines are skipped.
    fn poll(&mut self) -> Result<Option<String>, RigError>;
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn send(&mut self, line: &str) -> Result<(), RigError> {
        (**self).send(line)
    }

    fn poll(&mut self) -> Result<Option<String>, RigError> {
        (**self).poll()
    }
}

/// Splits a byte stream into trimmed, non-empty lines.
///
/// A partial line longer than `MAX_LINE_BYTES` is dropped.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    bytes: VecDeque<u8>,
}

impl LineBuffer {
    pub(crate) fn extend(&mut self, data: &[u8]) {
        self.bytes.extend(data);
        let tail = match self.bytes.iter().rposition(|b| *b == b'\n') {
            Some(end) => self.bytes.len() - end - 1,
            None => self.bytes.len(),
        };
        if tail > MAX_LINE_BYTES {
            log::warn!("Dropped {} bytes without a line end", tail);
            let keep = self.bytes.len() - tail;
            self.bytes.truncate(keep);
        }
    }

    pub(crate) fn next_line(&mut self) -> Option<String> {
        while let Some(end) = self.bytes.iter().position(|b| *b == b'\n') {
            let raw = self.bytes.drain(..=end).collect::<Vec<_>>();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim();
            if !line.is_empty() {
                return Some(line.to_string());
            }
        }
        None
    }
}

/// [`Link`] over a serial port.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    buffer: LineBuffer,
}

impl SerialLink {
    /// Opens `port_name` and drops whatever the device sent before.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<SerialLink, RigError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(SERIAL_TIMEOUT_MS))
            .open()?;
        log::info!("Opened serial port {} at {} baud", port_name, baud_rate);
        let mut link = SerialLink::from_port(port);
        flush(&mut link.port)?;
        Ok(link)
    }

    pub fn from_port(port: Box<dyn SerialPort>) -> SerialLink {
        SerialLink {
            port,
            buffer: LineBuffer::default(),
        }
    }
}

impl Link for SerialLink {
    fn send(&mut self, line: &str) -> Result<(), RigError> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.port.write_all(&data)?;
        self.port.flush()?;
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<String>, RigError> {
        if let Some(line) = self.buffer.next_line() {
            return Ok(Some(line));
        }
        let n_read = get_n_read(&mut self.port)?;
        if n_read == 0 {
            return Ok(None);
        }
        let mut data: Vec<u8> = vec![0; n_read];
        match self.port.read(data.as_mut_slice()) {
            Ok(n) => self.buffer.extend(&data[..n]),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        Ok(self.buffer.next_line())
    }
}

fn get_n_read(port: &mut Box<dyn SerialPort>) -> Result<usize, RigError> {
    let n_u32: u32 = port.bytes_to_read()?;
    Ok(n_u32.try_into().unwrap_or(0))
}

fn flush(port: &mut Box<dyn SerialPort>) -> Result<(), RigError> {
    let n_read: usize = get_n_read(port).unwrap_or(0);
    if n_read == 0 {
        return Ok(());
    }
    let mut stale: Vec<u8> = vec![0; n_read];
    port.read(stale.as_mut_slice())?;
    log::debug!("Dropped {} stale bytes", n_read);
    Ok(())
}

/// In-memory [`Link`]. Clones share the same queues, so a test can keep a
/// handle while the orchestrator owns another.
#[derive(Clone, Debug, Default)]
pub struct MockLink {
    inner: Arc<Mutex<MockLinkInner>>,
}

#[derive(Debug, Default)]
struct MockLinkInner {
    inbound: VecDeque<String>,
    sent: Vec<String>,
    fail_sends: bool,
}

impl MockLink {
    pub fn new() -> MockLink {
        MockLink::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockLinkInner> {
        // a panicking test thread must not hide the queues from the others
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues a line to be returned by `poll`.
    pub fn push_line(&self, line: &str) {
        self.lock().inbound.push_back(line.to_string());
    }

    /// Lines sent so far, without terminators.
    pub fn sent(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Makes every following `send` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.lock().fail_sends = fail;
    }
}

impl Link for MockLink {
    fn send(&mut self, line: &str) -> Result<(), RigError> {
        let mut inner = self.lock();
        if inner.fail_sends {
            return Err(RigError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock link closed",
            )));
        }
        inner.sent.push(line.to_string());
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<String>, RigError> {
        let mut inner = self.lock();
        while let Some(line) = inner.inbound.pop_front() {
            let line = line.trim();
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer() {
        let mut buffer = LineBuffer::default();
        buffer.extend(b"MF\r\n\n  \nreset ");
        assert_eq!(buffer.next_line(), Some("MF".to_string()));
        assert_eq!(buffer.next_line(), None);
        buffer.extend(b"done\n");
        assert_eq!(buffer.next_line(), Some("reset done".to_string()));
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn test_line_buffer_drops_unterminated_bytes() {
        let mut buffer = LineBuffer::default();
        buffer.extend(b"MF\n");
        buffer.extend(&vec![b'7'; MAX_LINE_BYTES]);
        buffer.extend(b"7");
        assert_eq!(buffer.next_line(), Some("MF".to_string()));
        assert_eq!(buffer.next_line(), None);

        // the stream recovers at the next line
        buffer.extend(b"reset done\n");
        assert_eq!(buffer.next_line(), Some("reset done".to_string()));
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn test_line_buffer_invalid_utf8() {
        let mut buffer = LineBuffer::default();
        buffer.extend(&[0xFF, b'M', b'F', b'\n']);
        assert_eq!(buffer.next_line(), Some("\u{FFFD}MF".to_string()));
    }

    #[test]
    fn test_mock_link() {
        let handle = MockLink::new();
        let mut link = handle.clone();
        handle.push_line("MF");
        handle.push_line("");
        handle.push_line("measure done\r");

        assert_eq!(link.poll().unwrap(), Some("MF".to_string()));
        assert_eq!(link.poll().unwrap(), Some("measure done".to_string()));
        assert_eq!(link.poll().unwrap(), None);

        link.send("90.000").unwrap();
        assert_eq!(handle.sent(), vec!["90.000".to_string()]);

        handle.fail_sends(true);
        assert!(matches!(link.send("reset angle"), Err(RigError::Io(_))));
        assert_eq!(handle.sent().len(), 1);
    }

    #[cfg(unix)]
    mod serial {
        use super::super::*;
        use crate::time::sleep_ms;
        use serialport::TTYPort;
        use std::io::{Read, Write};

        #[test]
        fn test_send_appends_newline() {
            let (mut master, slave) = TTYPort::pair().expect("Unable to create ptty pair");
            let mut link = SerialLink::from_port(Box::new(slave));
            link.send("12.857").unwrap();

            sleep_ms(10);

            let mut buf = [0u8; 7];
            master.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"12.857\n");
        }

        #[test]
        fn test_poll_returns_one_line_at_a_time() {
            let (mut master, slave) = TTYPort::pair().expect("Unable to create ptty pair");
            let mut link = SerialLink::from_port(Box::new(slave));
            assert_eq!(link.poll().unwrap(), None);

            master.write_all(b"MF\r\nreset do").unwrap();
            sleep_ms(10);
            assert_eq!(link.poll().unwrap(), Some("MF".to_string()));
            assert_eq!(link.poll().unwrap(), None);

            master.write_all(b"ne\n").unwrap();
            sleep_ms(10);
            assert_eq!(link.poll().unwrap(), Some("reset done".to_string()));
        }
    }
}
