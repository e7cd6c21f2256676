//! The codec handle
//!
//! An [`Odr`] handle carries a direction and all mutable state of one
//! encode, decode or print run. The same type operation serves all three
//! directions by branching on [`Odr::direction`] internally.

use crate::ber::{BerDecoder, BerEncoder, BerLength, BerTag, BerTagClass};
use crate::codec::print::Printer;
use crate::codec::stack::{FrameEnd, FrameStack};
use crate::codec::{OdrFn, OdrType};
use bytes::Bytes;
use odr_core::{BlockPool, Nmem, OdrConfig, OdrError, OdrErrorCode, OdrResult};
use std::io;
use std::sync::Arc;

/// Direction of a codec handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Read BER octets into values
    Decode,
    /// Write values as BER octets
    Encode,
    /// Render values as indented text
    Print,
}

/// Codec handle
///
/// A handle is not meant to be shared: its cursor, frame stack and arena are
/// mutated by every operation. Use one handle per connection or thread.
///
/// # Errors
///
/// The first error an operation hits is recorded on the handle and returned.
/// Every later operation fails fast with the same error until
/// [`Odr::reset`], so a caller deep in a structure only has to propagate
/// with `?`.
///
/// # Usage Example
///
/// ```
/// use odr_ber::codec::{primitive, Direction, Odr};
///
/// let mut enc = Odr::new(Direction::Encode);
/// primitive::integer(&mut enc, &mut Some(42), false, "count").unwrap();
/// let bytes = enc.take_buf();
///
/// let mut dec = Odr::new(Direction::Decode);
/// dec.set_buf(bytes);
/// let mut value = None;
/// primitive::integer(&mut dec, &mut value, false, "count").unwrap();
/// assert_eq!(value, Some(42));
/// ```
#[derive(Debug)]
pub struct Odr {
    direction: Direction,
    config: OdrConfig,
    pub(crate) encoder: BerEncoder,
    pub(crate) decoder: BerDecoder,
    error: Option<OdrError>,
    implicit: Option<(BerTagClass, u32)>,
    bias: Option<i32>,
    pub(crate) stack: FrameStack,
    mem: Nmem,
    pub(crate) printer: Printer,
}

impl Odr {
    /// Create a handle with the default configuration
    pub fn new(direction: Direction) -> Self {
        Self::build(direction, OdrConfig::default(), Arc::new(BlockPool::new()))
    }

    /// Create a handle with a custom configuration
    pub fn with_config(direction: Direction, config: OdrConfig) -> OdrResult<Self> {
        Self::with_pool(direction, config, Arc::new(BlockPool::new()))
    }

    /// Create a handle whose arena recycles blocks through a shared pool
    pub fn with_pool(
        direction: Direction,
        config: OdrConfig,
        pool: Arc<BlockPool>,
    ) -> OdrResult<Self> {
        config.validate()?;
        Ok(Self::build(direction, config, pool))
    }

    fn build(direction: Direction, config: OdrConfig, pool: Arc<BlockPool>) -> Self {
        let mem = Nmem::with_pool(pool, config.mem_block_size, config.mem_limit);
        Self {
            direction,
            encoder: BerEncoder::new(),
            decoder: BerDecoder::default(),
            error: None,
            implicit: None,
            bias: None,
            stack: FrameStack::new(config.max_depth),
            mem,
            printer: Printer::new(),
            config,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_decode(&self) -> bool {
        self.direction == Direction::Decode
    }

    pub fn is_encode(&self) -> bool {
        self.direction == Direction::Encode
    }

    pub fn is_print(&self) -> bool {
        self.direction == Direction::Print
    }

    pub fn config(&self) -> &OdrConfig {
        &self.config
    }

    /// Install the input of a decode run
    pub fn set_buf(&mut self, buf: impl Into<Bytes>) {
        self.decoder = BerDecoder::new(buf.into());
        self.stack.clear();
    }

    /// Octets encoded so far
    pub fn buf(&self) -> &[u8] {
        self.encoder.as_bytes()
    }

    /// Take the encoded octets, leaving the output buffer empty
    pub fn take_buf(&mut self) -> Bytes {
        self.encoder.take()
    }

    /// Current offset in the output (encode) or input (decode)
    pub fn position(&self) -> usize {
        match self.direction {
            Direction::Decode => self.decoder.position(),
            _ => self.encoder.position(),
        }
    }

    /// Input octets not consumed yet
    pub fn remaining(&self) -> usize {
        self.decoder.remaining(self.decoder.len())
    }

    /// Prepare the handle for the next run
    ///
    /// Clears the error, the encode and decode buffers, buffered print text,
    /// the frame stack and any pending tag override or bias, and releases
    /// the arena generation. An installed print stream is kept. Values decoded
    /// earlier stay valid; their arena blocks return to circulation once
    /// they are dropped.
    pub fn reset(&mut self) {
        self.error = None;
        self.encoder.clear();
        self.decoder = BerDecoder::default();
        self.stack.clear();
        self.implicit = None;
        self.bias = None;
        self.printer.reset();
        self.mem.reset();
        log::trace!("odr: reset, arena generation {}", self.mem.generation());
    }

    /// The error recorded on the handle, if any
    pub fn error(&self) -> Option<&OdrError> {
        self.error.as_ref()
    }

    /// Code of the recorded error, [`OdrErrorCode::None`] if there is none
    pub fn error_code(&self) -> OdrErrorCode {
        self.error
            .as_ref()
            .map_or(OdrErrorCode::None, OdrError::code)
    }

    pub fn mem(&self) -> &Nmem {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut Nmem {
        &mut self.mem
    }

    /// Send print output to a stream instead of the internal buffer
    pub fn set_print_stream(&mut self, stream: Box<dyn io::Write + Send>) {
        self.printer.set_stream(stream);
    }

    /// Text printed so far into the internal buffer
    pub fn print_output(&self) -> &str {
        self.printer.output()
    }

    pub fn take_print_output(&mut self) -> String {
        self.printer.take_output()
    }

    /// Number of open constructed values
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Override the tag of the next element (implicit tagging)
    ///
    /// The override is consumed by the next element that reads or writes a
    /// tag, whether or not that element is present.
    pub fn implicit_settag(&mut self, class: BerTagClass, tag: u32) {
        self.implicit = Some((class, tag));
    }

    pub(crate) fn take_implicit(&mut self) -> Option<(BerTagClass, u32)> {
        self.implicit.take()
    }

    /// Pre-select the CHOICE arm with discriminant `which` for the next
    /// [`Odr::choice`] call; only meaningful when decoding
    pub fn choice_bias(&mut self, which: i32) {
        if self.is_decode() {
            self.bias = Some(which);
        }
    }

    pub(crate) fn take_bias(&mut self) -> Option<i32> {
        self.bias.take()
    }

    /// Fail fast if an error was recorded earlier
    pub fn check(&self) -> OdrResult<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Record `err` on the handle unless an error is already recorded
    ///
    /// # Returns
    /// The error that is now recorded on the handle.
    pub fn record(&mut self, err: OdrError) -> OdrError {
        if let Some(existing) = &self.error {
            return existing.clone();
        }
        let err = if err.element().is_empty() {
            let path = self.stack.path();
            err.with_element(path)
        } else {
            err
        };
        log::debug!("odr: {:?} failed: {}", self.direction, err);
        self.error = Some(err.clone());
        err
    }

    /// Record an error built from a code and additional information
    pub fn fail<T>(&mut self, code: OdrErrorCode, addinfo: impl Into<String>) -> OdrResult<T> {
        Err(self.record(OdrError::new(code).with_addinfo(addinfo)))
    }

    /// Record the error of `result`, if any
    pub fn guard<T>(&mut self, result: OdrResult<T>) -> OdrResult<T> {
        result.map_err(|err| self.record(err))
    }

    /// Outcome for an element that is not there
    ///
    /// An absent optional element is success; an absent required element
    /// records [`OdrErrorCode::Required`] with the element name.
    pub fn missing(&mut self, optional: bool, name: &str) -> OdrResult<()> {
        self.check()?;
        if optional {
            Ok(())
        } else {
            self.fail(OdrErrorCode::Required, name)
        }
    }

    /// Run `op` on a required field stored without `Option`
    pub fn required<T: Default>(&mut self, op: OdrFn<T>, value: &mut T, name: &str) -> OdrResult<()> {
        let mut cell = match self.direction {
            Direction::Decode => None,
            _ => Some(std::mem::take(value)),
        };
        let result = op(self, &mut cell, false, name);
        if let Some(v) = cell {
            *value = v;
        }
        result
    }

    /// [`Odr::required`] for a type with a natural encoding
    pub fn field<T: OdrType + Default>(&mut self, value: &mut T, name: &str) -> OdrResult<()> {
        self.required(T::odr, value, name)
    }

    /// End of the innermost definite body, or the end of the input
    pub(crate) fn bound(&self) -> usize {
        self.stack
            .definite_end()
            .unwrap_or_else(|| self.decoder.len())
    }

    /// Whether the innermost open constructed value has more members
    ///
    /// Outside any constructed value this reports whether input remains.
    /// Always false when encoding or printing.
    pub fn constructed_more(&self) -> bool {
        if !self.is_decode() {
            return false;
        }
        match self.stack.top().map(|frame| frame.end) {
            Some(FrameEnd::At(end)) => self.decoder.position() < end,
            Some(FrameEnd::EndOfContents) => {
                let end = self.bound();
                self.decoder.remaining(end) > 0 && !self.decoder.at_end_of_contents(end)
            }
            None => self.remaining() > 0,
        }
    }

    /// Read or write the identifier of the next element
    ///
    /// Consumes any pending tag override. `present` tells whether the value
    /// slot holds a value (encode and print); it is ignored when decoding.
    ///
    /// # Returns
    /// `Ok(None)` if the element is absent (no value, or the next encoded
    /// tag does not match), otherwise whether the encoding is constructed.
    pub(crate) fn ber_tag(
        &mut self,
        present: bool,
        class: BerTagClass,
        tag: u32,
        constructed: bool,
    ) -> OdrResult<Option<bool>> {
        self.check()?;
        let (class, tag) = self.take_implicit().unwrap_or((class, tag));
        match self.direction {
            Direction::Encode => {
                if !present {
                    return Ok(None);
                }
                self.encoder
                    .write_tag(&BerTag::new(class, constructed, tag));
                Ok(Some(constructed))
            }
            Direction::Print => Ok(present.then_some(constructed)),
            Direction::Decode => {
                if !self.constructed_more() {
                    return Ok(None);
                }
                let bound = self.bound();
                let peeked = self.decoder.peek_tag(bound);
                match self.guard(peeked)? {
                    Some((found, len)) if found.matches(class, tag) => {
                        self.decoder.advance(len);
                        Ok(Some(found.is_constructed()))
                    }
                    _ => Ok(None),
                }
            }
        }
    }

    /// Peek at the next tag without consuming it (decode only)
    pub(crate) fn peek_tag(&mut self) -> OdrResult<Option<BerTag>> {
        if !self.constructed_more() {
            return Ok(None);
        }
        let bound = self.bound();
        let peeked = self.decoder.peek_tag(bound);
        Ok(self.guard(peeked)?.map(|(tag, _)| tag))
    }

    /// Read the definite length and content octets of a primitive element
    pub(crate) fn read_content(&mut self) -> OdrResult<Bytes> {
        let bound = self.bound();
        let length = self.decoder.read_length(bound);
        match self.guard(length)? {
            BerLength::Definite(len) => {
                let bytes = self.decoder.read_bytes(len, bound);
                self.guard(bytes)
            }
            BerLength::Indefinite => {
                self.fail(OdrErrorCode::Proto, "indefinite length on primitive encoding")
            }
        }
    }

    /// Copy decoded octets into the arena
    pub(crate) fn arena_copy(&mut self, bytes: &[u8]) -> OdrResult<Bytes> {
        let copied = self.mem.memdup(bytes);
        self.guard(copied)
    }

    /// Print one `name value` line
    pub(crate) fn print_line(&mut self, name: &str, value: &str) -> OdrResult<()> {
        let written = self.printer.line(name, value);
        self.print_result(written)
    }

    pub(crate) fn print_result(&mut self, written: io::Result<()>) -> OdrResult<()> {
        written.or_else(|err| self.fail(OdrErrorCode::SysErr, format!("print: {}", err)))
    }
}
