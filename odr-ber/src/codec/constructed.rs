//! Constructed values: SEQUENCE, SET, SEQUENCE OF, SET OF and tagging
//!
//! Every constructed value is bracketed by a begin call that reads or writes
//! its tag and length and pushes a frame, and an end call that pops the
//! frame. When encoding, begin reserves a length slot and end patches it
//! once the body size is known.

use crate::ber::{universal, BerLength, BerTagClass};
use crate::codec::handle::{Direction, Odr};
use crate::codec::stack::{Frame, FrameEnd};
use crate::codec::OdrFn;
use odr_core::{OdrErrorCode, OdrResult};

/// Capacity of the first allocation made for a decoded SEQUENCE OF
pub const SEQUENCE_OF_INITIAL_CAPACITY: usize = 5;

impl Odr {
    /// Open a constructed value with the given tag
    ///
    /// A pending tag override replaces `class` and `tag`.
    ///
    /// # Returns
    /// `false` if the value is absent: `present` is false when encoding or
    /// printing, or the next tag does not match when decoding.
    ///
    /// # Errors
    /// - [`OdrErrorCode::Stack`] if the nesting limit is reached
    /// - [`OdrErrorCode::Proto`] if a decoded length exceeds the enclosing data
    pub fn constructed_begin(
        &mut self,
        present: bool,
        class: BerTagClass,
        tag: u32,
        name: &str,
    ) -> OdrResult<bool> {
        self.open_frame(present, class, tag, name, true)
    }

    pub(crate) fn open_frame(
        &mut self,
        present: bool,
        class: BerTagClass,
        tag: u32,
        name: &str,
        print_brace: bool,
    ) -> OdrResult<bool> {
        let Some(constructed) = self.ber_tag(present, class, tag, true)? else {
            return Ok(false);
        };
        self.push_frame(name, constructed, print_brace)?;
        Ok(true)
    }

    /// Push a frame for a constructed value whose tag was just handled
    pub(crate) fn push_frame(
        &mut self,
        name: &str,
        constructed: bool,
        print_brace: bool,
    ) -> OdrResult<()> {
        if self.stack.depth() >= self.config().max_depth {
            return self.fail(
                OdrErrorCode::Stack,
                format!("nesting exceeds {} levels at {}", self.config().max_depth, name),
            );
        }

        let mut frame = Frame::named(name);
        match self.direction() {
            Direction::Encode => {
                frame.len_width = self.config().length_reserve;
                frame.len_offset = self.encoder.reserve_length(frame.len_width);
                frame.base = self.encoder.position();
            }
            Direction::Decode => {
                if !constructed {
                    return self.fail(
                        OdrErrorCode::Proto,
                        format!("{} uses a primitive encoding", name),
                    );
                }
                let bound = self.bound();
                let length = self.decoder.read_length(bound);
                frame.end = match self.guard(length)? {
                    BerLength::Definite(len) => {
                        let available = self.decoder.remaining(bound);
                        if len > available {
                            return self.fail(
                                OdrErrorCode::Proto,
                                format!(
                                    "{} declares {} bytes but only {} remain",
                                    name, len, available
                                ),
                            );
                        }
                        FrameEnd::At(self.decoder.position() + len)
                    }
                    BerLength::Indefinite => FrameEnd::EndOfContents,
                };
            }
            Direction::Print => {
                if print_brace {
                    let written = self.printer.open(name);
                    self.print_result(written)?;
                    frame.printed = true;
                }
            }
        }

        log::trace!("odr: open {} at depth {}", name, self.stack.depth());
        if self.stack.push(frame).is_err() {
            return self.fail(OdrErrorCode::Stack, name);
        }
        Ok(())
    }

    /// Close the innermost constructed value
    ///
    /// # Errors
    /// - [`OdrErrorCode::ConLen`] if a definite-length body was not consumed
    ///   exactly when decoding
    /// - [`OdrErrorCode::LenOv`] if the body length cannot be written back
    pub fn constructed_end(&mut self) -> OdrResult<()> {
        self.check()?;
        let Some(frame) = self.stack.pop() else {
            return self.fail(OdrErrorCode::Other, "constructed end without begin");
        };
        log::trace!("odr: close {} at depth {}", frame.name, self.stack.depth());
        match self.direction() {
            Direction::Encode => {
                let len = self.encoder.position() - frame.base;
                let patched = self
                    .encoder
                    .patch_length(frame.len_offset, frame.len_width, len);
                self.guard(patched)
            }
            Direction::Decode => match frame.end {
                FrameEnd::At(end) => {
                    let position = self.decoder.position();
                    if position == end {
                        Ok(())
                    } else {
                        self.fail(
                            OdrErrorCode::ConLen,
                            format!(
                                "{} ends at offset {} but decoding stopped at {}",
                                frame.name, end, position
                            ),
                        )
                    }
                }
                FrameEnd::EndOfContents => {
                    let bound = self.bound();
                    let eoc = self.decoder.read_end_of_contents(bound);
                    self.guard(eoc)
                }
            },
            Direction::Print => {
                if frame.printed {
                    let written = self.printer.close();
                    self.print_result(written)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Open a SEQUENCE, creating a default value in `slot` when decoding
    pub fn sequence_begin<T: Default>(&mut self, slot: &mut Option<T>, name: &str) -> OdrResult<bool> {
        self.aggregate_begin(slot, universal::SEQUENCE, name)
    }

    pub fn sequence_end(&mut self) -> OdrResult<()> {
        self.constructed_end()
    }

    /// Whether the open SEQUENCE has more members to decode
    pub fn sequence_more(&self) -> bool {
        self.constructed_more()
    }

    /// Open a SET, creating a default value in `slot` when decoding
    ///
    /// Members are processed in declaration order in every direction.
    pub fn set_begin<T: Default>(&mut self, slot: &mut Option<T>, name: &str) -> OdrResult<bool> {
        self.aggregate_begin(slot, universal::SET, name)
    }

    pub fn set_end(&mut self) -> OdrResult<()> {
        self.constructed_end()
    }

    fn aggregate_begin<T: Default>(
        &mut self,
        slot: &mut Option<T>,
        tag: u32,
        name: &str,
    ) -> OdrResult<bool> {
        if self.is_decode() {
            *slot = None;
        }
        if !self.constructed_begin(slot.is_some(), BerTagClass::Universal, tag, name)? {
            return Ok(false);
        }
        if self.is_decode() {
            *slot = Some(T::default());
        }
        Ok(true)
    }

    /// Process a SEQUENCE whose members are handled by `body`
    ///
    /// On a decode failure the slot is cleared, so callers never observe a
    /// half-built value.
    ///
    /// # Usage Example
    ///
    /// ```
    /// use odr_ber::codec::{primitive, Direction, Odr};
    ///
    /// #[derive(Debug, Default, PartialEq)]
    /// struct Point {
    ///     x: i64,
    ///     y: Option<i64>,
    /// }
    ///
    /// fn point(o: &mut Odr, slot: &mut Option<Point>, optional: bool, name: &str) -> odr_core::OdrResult<()> {
    ///     o.sequence(slot, optional, name, |o, p| {
    ///         o.required(primitive::integer, &mut p.x, "x")?;
    ///         primitive::integer(o, &mut p.y, true, "y")
    ///     })
    /// }
    ///
    /// let mut enc = Odr::new(Direction::Encode);
    /// point(&mut enc, &mut Some(Point { x: 1, y: None }), false, "point").unwrap();
    /// assert_eq!(enc.buf(), &[0x30, 0x03, 0x02, 0x01, 0x01]);
    /// ```
    pub fn sequence<T, F>(&mut self, slot: &mut Option<T>, optional: bool, name: &str, body: F) -> OdrResult<()>
    where
        T: Default,
        F: FnOnce(&mut Odr, &mut T) -> OdrResult<()>,
    {
        self.check()?;
        if !self.sequence_begin(slot, name)? {
            return self.missing(optional, name);
        }
        self.aggregate_body(slot, body)
    }

    /// Process a SET whose members are handled by `body`
    pub fn set<T, F>(&mut self, slot: &mut Option<T>, optional: bool, name: &str, body: F) -> OdrResult<()>
    where
        T: Default,
        F: FnOnce(&mut Odr, &mut T) -> OdrResult<()>,
    {
        self.check()?;
        if !self.set_begin(slot, name)? {
            return self.missing(optional, name);
        }
        self.aggregate_body(slot, body)
    }

    fn aggregate_body<T, F>(&mut self, slot: &mut Option<T>, body: F) -> OdrResult<()>
    where
        F: FnOnce(&mut Odr, &mut T) -> OdrResult<()>,
    {
        let result = match slot.as_mut() {
            Some(value) => body(self, value),
            None => self.fail(OdrErrorCode::Other, "constructed value without storage"),
        };
        let result = result.and_then(|()| self.constructed_end());
        if result.is_err() && self.is_decode() {
            *slot = None;
        }
        result
    }

    /// Process a SEQUENCE OF with `op` handling each element
    ///
    /// A decoded empty SEQUENCE OF is an empty vector that has not
    /// allocated. Storage grows to [`SEQUENCE_OF_INITIAL_CAPACITY`] on the
    /// first element and doubles after that.
    pub fn sequence_of<T>(
        &mut self,
        op: OdrFn<T>,
        slot: &mut Option<Vec<T>>,
        optional: bool,
        name: &str,
    ) -> OdrResult<()> {
        self.repeated(universal::SEQUENCE, op, slot, optional, name)
    }

    /// Process a SET OF with `op` handling each element, kept in wire order
    pub fn set_of<T>(
        &mut self,
        op: OdrFn<T>,
        slot: &mut Option<Vec<T>>,
        optional: bool,
        name: &str,
    ) -> OdrResult<()> {
        self.repeated(universal::SET, op, slot, optional, name)
    }

    fn repeated<T>(
        &mut self,
        tag: u32,
        op: OdrFn<T>,
        slot: &mut Option<Vec<T>>,
        optional: bool,
        name: &str,
    ) -> OdrResult<()> {
        self.check()?;
        if self.is_decode() {
            *slot = None;
        }
        if !self.constructed_begin(slot.is_some(), BerTagClass::Universal, tag, name)? {
            return self.missing(optional, name);
        }

        if self.is_decode() {
            let mut items: Vec<T> = Vec::new();
            while self.constructed_more() {
                if items.len() == items.capacity() {
                    let grow = match items.capacity() {
                        0 => SEQUENCE_OF_INITIAL_CAPACITY,
                        capacity => capacity,
                    };
                    items.reserve_exact(grow);
                }
                let mut item = None;
                if let Err(err) = op(self, &mut item, false, name) {
                    *slot = None;
                    return Err(err);
                }
                match item {
                    Some(value) => items.push(value),
                    None => {
                        *slot = None;
                        return self.fail(OdrErrorCode::Required, name);
                    }
                }
            }
            *slot = Some(items);
            let ended = self.constructed_end();
            if ended.is_err() {
                *slot = None;
            }
            return ended;
        }

        let items = slot.take().unwrap_or_default();
        let mut kept = Vec::with_capacity(items.len());
        let mut result = Ok(());
        for item in items {
            if result.is_err() {
                kept.push(item);
                continue;
            }
            let mut cell = Some(item);
            result = op(self, &mut cell, false, name);
            kept.extend(cell);
        }
        *slot = Some(kept);
        result?;
        self.constructed_end()
    }

    /// Process an element under an IMPLICIT tag
    pub fn implicit_tag<T>(
        &mut self,
        op: OdrFn<T>,
        slot: &mut Option<T>,
        optional: bool,
        class: BerTagClass,
        tag: u32,
        name: &str,
    ) -> OdrResult<()> {
        self.implicit_settag(class, tag);
        op(self, slot, optional, name)
    }

    /// Process an element under an EXPLICIT tag
    ///
    /// The tag wraps the element's own encoding in a constructed value. The
    /// inner element is always required once the wrapper is present, and
    /// prints without a brace of its own.
    pub fn explicit_tag<T>(
        &mut self,
        op: OdrFn<T>,
        slot: &mut Option<T>,
        optional: bool,
        class: BerTagClass,
        tag: u32,
        name: &str,
    ) -> OdrResult<()> {
        self.check()?;
        if self.is_decode() {
            *slot = None;
        }
        if !self.open_frame(slot.is_some(), class, tag, name, false)? {
            return self.missing(optional, name);
        }
        op(self, slot, false, name)?;
        self.constructed_end()
    }
}
