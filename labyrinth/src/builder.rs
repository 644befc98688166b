use crate::config::Watermarks;
use crate::context::{Handshake, SerialPort};
use crate::error::Error;
use crate::serial::SerialTransport;

/// Checked construction of a [`SerialTransport`]
pub struct LinkBuilder<P, H, R, T> {
    port: Option<P>,
    handshake: Option<H>,
    on_receive: Option<R>,
    on_ready: Option<T>,
    marks: Option<Watermarks>,
}

impl<P, H, R, T> LinkBuilder<P, H, R, T>
where
    P: SerialPort,
    H: Handshake,
    R: Fn(u8),
    T: Fn(),
{
    pub fn new() -> Self {
        Self {
            port: None,
            handshake: None,
            on_receive: None,
            on_ready: None,
            marks: None,
        }
    }

    pub fn with_port(mut self, port: P) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_handshake(mut self, handshake: H) -> Self {
        self.handshake = Some(handshake);
        self
    }

    pub fn on_receive(mut self, callback: R) -> Self {
        self.on_receive = Some(callback);
        self
    }

    pub fn on_ready_to_send(mut self, callback: T) -> Self {
        self.on_ready = Some(callback);
        self
    }

    /// Defaults to [`Watermarks::for_capacity`] of the buffer
    pub fn with_watermarks(mut self, marks: Watermarks) -> Self {
        self.marks = Some(marks);
        self
    }

    pub fn build<const N: usize>(self) -> Result<SerialTransport<P, H, R, T, N>, Error> {
        let port = self.port.ok_or(Error::InvalidConfig("Port not provided"))?;
        let handshake = self
            .handshake
            .ok_or(Error::InvalidConfig("Handshake pins not provided"))?;
        let on_receive = self
            .on_receive
            .ok_or(Error::InvalidConfig("Receive callback not provided"))?;
        let on_ready = self
            .on_ready
            .ok_or(Error::InvalidConfig("Ready callback not provided"))?;
        let marks = self.marks.unwrap_or(Watermarks::for_capacity(N));
        marks.check(N)?;
        Ok(SerialTransport::new(port, handshake, on_receive, on_ready, marks))
    }
}

impl<P, H, R, T> Default for LinkBuilder<P, H, R, T>
where
    P: SerialPort,
    H: Handshake,
    R: Fn(u8),
    T: Fn(),
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{TestingPins, TestingPort};

    type Builder<'a> = LinkBuilder<&'a TestingPort, &'a TestingPins, fn(u8), fn()>;

    fn ignore(_: u8) {}
    fn idle() {}

    #[test]
    fn with_all_parts() {
        let port = TestingPort::default();
        let pins = TestingPins::default();
        let result = Builder::new()
            .with_port(&port)
            .with_handshake(&pins)
            .on_receive(ignore)
            .on_ready_to_send(idle)
            .build::<64>();
        let link = result.unwrap();
        assert_eq!(link.watermarks(), Watermarks { high: 59, low: 16 });
    }

    #[test]
    fn without_callbacks() {
        let port = TestingPort::default();
        let pins = TestingPins::default();
        let result = Builder::new().with_port(&port).with_handshake(&pins).build::<64>();
        assert_eq!(
            result.err(),
            Some(Error::InvalidConfig("Receive callback not provided"))
        );
    }

    #[test]
    fn without_port() {
        let result = Builder::new()
            .on_receive(ignore)
            .on_ready_to_send(idle)
            .build::<64>();
        assert_eq!(result.err(), Some(Error::InvalidConfig("Port not provided")));
    }

    #[test]
    fn watermarks_checked_against_capacity() {
        let port = TestingPort::default();
        let pins = TestingPins::default();
        let result = Builder::new()
            .with_port(&port)
            .with_handshake(&pins)
            .on_receive(ignore)
            .on_ready_to_send(idle)
            .with_watermarks(Watermarks { high: 40, low: 8 })
            .build::<32>();
        assert!(result.is_err());
    }
}
