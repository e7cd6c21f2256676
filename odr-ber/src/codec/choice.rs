//! CHOICE dispatch and biasing
//!
//! A CHOICE value is a Rust enum implementing [`Choice`]. Its arms are
//! described by an immutable table of [`ChoiceArm`]s, usually a `static`
//! built with [`choice_arm!`](crate::choice_arm).

use crate::ber::BerTagClass;
use crate::codec::handle::{Direction, Odr};
use crate::codec::OdrFn;
use odr_core::{OdrErrorCode, OdrResult};

/// How an arm's tag relates to the tag of its payload type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMode {
    /// The arm tag replaces the payload's tag
    Implicit,
    /// The arm tag wraps the payload's own encoding
    Explicit,
    /// The payload keeps its own tag; decoded by trial
    Untagged,
}

/// One alternative of a CHOICE
///
/// `which` is the discriminant the value reports through
/// [`Choice::which`]. `class` and `tag` are ignored for untagged arms.
#[derive(Debug)]
pub struct ChoiceArm<V: 'static> {
    pub tag_mode: TagMode,
    pub class: BerTagClass,
    pub tag: u32,
    pub which: i32,
    pub op: OdrFn<V>,
    pub name: &'static str,
}

/// A value of a CHOICE type
pub trait Choice {
    /// Discriminant of the arm this value belongs to
    fn which(&self) -> i32;
}

impl Odr {
    /// Process a CHOICE value with the given arm table
    ///
    /// When decoding, arms are tried in table order: tagged arms match on
    /// the next tag, untagged arms by a trial decode, and the first arm that
    /// produces a value wins. A pending [`Odr::choice_bias`] restricts the
    /// search to arms with that discriminant. When encoding or printing, the
    /// arm is selected by the value's discriminant.
    ///
    /// # Returns
    /// `false` if no arm matched (decode) or there is no value (encode and
    /// print). The caller decides whether that is an error, usually through
    /// [`Odr::choice_field`].
    pub fn choice<V: Choice>(
        &mut self,
        arms: &[ChoiceArm<V>],
        slot: &mut Option<V>,
        name: &str,
    ) -> OdrResult<bool> {
        self.check()?;
        if self.take_implicit().is_some() {
            log::debug!("odr: implicit tag on CHOICE {} ignored", name);
        }

        if self.direction() == Direction::Decode {
            *slot = None;
            let bias = self.take_bias();
            let Some(next) = self.peek_tag()? else {
                return Ok(false);
            };
            for arm in arms {
                if bias.is_some_and(|which| which != arm.which) {
                    continue;
                }
                match arm.tag_mode {
                    TagMode::Implicit if next.matches(arm.class, arm.tag) => {
                        self.implicit_tag(arm.op, slot, false, arm.class, arm.tag, arm.name)?;
                        return Ok(true);
                    }
                    TagMode::Explicit if next.matches(arm.class, arm.tag) => {
                        self.explicit_tag(arm.op, slot, false, arm.class, arm.tag, arm.name)?;
                        return Ok(true);
                    }
                    TagMode::Untagged => {
                        (arm.op)(self, slot, true, arm.name)?;
                        if slot.is_some() {
                            return Ok(true);
                        }
                    }
                    _ => {}
                }
            }
            return Ok(false);
        }

        let Some(which) = slot.as_ref().map(Choice::which) else {
            return Ok(false);
        };
        let Some(arm) = arms.iter().find(|arm| arm.which == which) else {
            return self.fail(
                OdrErrorCode::Other,
                format!("{} has no arm for discriminant {}", name, which),
            );
        };
        match arm.tag_mode {
            TagMode::Implicit => self.implicit_tag(arm.op, slot, false, arm.class, arm.tag, arm.name)?,
            TagMode::Explicit => self.explicit_tag(arm.op, slot, false, arm.class, arm.tag, arm.name)?,
            TagMode::Untagged => (arm.op)(self, slot, false, arm.name)?,
        }
        Ok(true)
    }

    /// [`Odr::choice`] with the missing-field rule applied
    pub fn choice_field<V: Choice>(
        &mut self,
        arms: &[ChoiceArm<V>],
        slot: &mut Option<V>,
        optional: bool,
        name: &str,
    ) -> OdrResult<()> {
        if self.choice(arms, slot, name)? {
            Ok(())
        } else {
            self.missing(optional, name)
        }
    }
}

/// Run the payload operation of one arm on a CHOICE value
///
/// `wrap` builds the CHOICE value from a payload and `project` takes the
/// payload back out, handing the value back unchanged if it belongs to a
/// different arm. [`choice_arm!`](crate::choice_arm) generates both.
pub fn lift<V, P>(
    o: &mut Odr,
    slot: &mut Option<V>,
    optional: bool,
    name: &str,
    op: OdrFn<P>,
    wrap: fn(P) -> V,
    project: fn(V) -> Result<P, V>,
) -> OdrResult<()> {
    let mut payload = match slot.take() {
        Some(value) => match project(value) {
            Ok(payload) => Some(payload),
            Err(value) => {
                *slot = Some(value);
                return o.fail(OdrErrorCode::Other, format!("{} does not hold this arm", name));
            }
        },
        None => None,
    };
    let result = op(o, &mut payload, optional, name);
    *slot = payload.map(wrap);
    result
}

/// Build a [`ChoiceArm`](crate::codec::ChoiceArm) for an enum variant
///
/// ```
/// use bytes::Bytes;
/// use odr_ber::choice_arm;
/// use odr_ber::codec::{primitive, Choice, ChoiceArm};
///
/// #[derive(Debug)]
/// enum Term {
///     General(Bytes),
///     Numeric(i64),
/// }
///
/// impl Choice for Term {
///     fn which(&self) -> i32 {
///         match self {
///             Term::General(_) => 1,
///             Term::Numeric(_) => 2,
///         }
///     }
/// }
///
/// static TERM_ARMS: &[ChoiceArm<Term>] = &[
///     choice_arm!(Implicit, ContextSpecific, 45, Term::General, 1, primitive::octet_string, "general"),
///     choice_arm!(Untagged, Term::Numeric, 2, primitive::integer, "numeric"),
/// ];
/// # assert_eq!(TERM_ARMS.len(), 2);
/// ```
#[macro_export]
macro_rules! choice_arm {
    (Untagged, $enum:ident :: $variant:ident, $which:expr, $op:expr, $name:expr) => {
        $crate::choice_arm!(Untagged, Universal, 0, $enum::$variant, $which, $op, $name)
    };
    ($mode:ident, $class:ident, $tag:expr, $enum:ident :: $variant:ident, $which:expr, $op:expr, $name:expr) => {
        $crate::codec::ChoiceArm {
            tag_mode: $crate::codec::TagMode::$mode,
            class: $crate::ber::BerTagClass::$class,
            tag: $tag,
            which: $which,
            op: {
                fn arm_op(
                    o: &mut $crate::codec::Odr,
                    slot: &mut ::core::option::Option<$enum>,
                    optional: bool,
                    name: &str,
                ) -> $crate::odr_core::OdrResult<()> {
                    $crate::codec::lift(o, slot, optional, name, $op, $enum::$variant, |value| {
                        match value {
                            $enum::$variant(payload) => ::core::result::Result::Ok(payload),
                            #[allow(unreachable_patterns)]
                            other => ::core::result::Result::Err(other),
                        }
                    })
                }
                arm_op
            },
            name: $name,
        }
    };
}
