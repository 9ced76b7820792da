// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lock-step walk of a schema against a read iterator stack.
//!
//! Every container the walk enters goes through [`nested`], which closes the
//! frame before any error propagates.

use super::{DecodeError, DecodeResult, VariantReader};
use crate::config::Limits;
use crate::iter::{ContainerIterator, IteratorStack};
use crate::schema::{DictSink, Slot};
use crate::wire::{WireError, WireType};

pub(crate) fn top<'s, 'm>(stack: &'s mut IteratorStack<'m>) -> DecodeResult<&'s mut ContainerIterator<'m>> {
    stack
        .top_mut()
        .ok_or(DecodeError::Wire(WireError::NotReading))
}

/// A string slot also takes an object path.
fn compatible(expected: WireType, found: WireType) -> bool {
    expected == found || (expected == WireType::String && found == WireType::ObjectPath)
}

/// Run `f` one level deeper, inside the current container value.
pub(crate) fn nested<'m, T>(
    stack: &mut IteratorStack<'m>,
    limits: &Limits,
    f: impl FnOnce(&mut IteratorStack<'m>) -> DecodeResult<T>,
) -> DecodeResult<T> {
    if stack.nesting() >= limits.max_depth {
        return Err(DecodeError::DepthExceeded(limits.max_depth));
    }
    stack.open_read()?;
    let result = f(stack);
    stack.close_read();
    result
}

/// Walk `slots` over the values at the top iterator's level.
pub(crate) fn walk(slots: &mut [Slot<'_>], stack: &mut IteratorStack<'_>, limits: &Limits) -> DecodeResult<()> {
    let mut index = 0;
    let mut previous = None;
    loop {
        let wire = top(stack)?.current_arg_type();
        let Some(slot) = slots.get(index) else {
            return if wire == WireType::Invalid {
                Ok(())
            } else {
                Err(DecodeError::MoreFieldsThanRequired)
            };
        };

        if matches!(slot, Slot::Bump) {
            match previous {
                Some(prev) => {
                    while top(stack)?.current_arg_type() != WireType::Invalid {
                        decode_slot(&mut slots[prev], stack, limits)?;
                        top(stack)?.advance()?;
                    }
                }
                None => while top(stack)?.advance()? {},
            }
            index += 1;
            continue;
        }

        if wire == WireType::Invalid {
            return Err(DecodeError::LessFieldsThanRequired);
        }
        decode_slot(&mut slots[index], stack, limits)?;
        top(stack)?.advance()?;
        previous = Some(index);
        index += 1;
    }
}

/// Decode the current value into `slot` without advancing.
pub(crate) fn decode_slot(slot: &mut Slot<'_>, stack: &mut IteratorStack<'_>, limits: &Limits) -> DecodeResult<()> {
    let current = top(stack)?;
    let wire = current.current_arg_type();
    log::trace!("[hdbus::decode] {} slot at {}", slot.name(), wire);

    match slot {
        Slot::Basic(dest) => {
            let expected = dest.wire_type();
            if !compatible(expected, wire) {
                return Err(DecodeError::InvalidBasicType {
                    expected,
                    found: wire,
                });
            }
            let value = current.read_basic()?;
            if dest.store(value) {
                Ok(())
            } else {
                Err(DecodeError::InvalidBasicType {
                    expected,
                    found: wire,
                })
            }
        }
        Slot::Struct(schema) => {
            if wire != WireType::Struct {
                return Err(DecodeError::InvalidStructType { found: wire });
            }
            nested(stack, limits, |stack| walk(&mut schema.slots, stack, limits))
        }
        Slot::Array(sink) => {
            if wire != WireType::Array {
                return Err(DecodeError::InvalidArrayType { found: wire });
            }
            let element = current.current_element_type();
            if sink.element_type().is_some_and(|expected| !compatible(expected, element)) {
                return Err(DecodeError::InvalidArrayType { found: element });
            }
            sink.clear();
            nested(stack, limits, |stack| {
                if sink.fixed_element() == Some(element) {
                    let array = top(stack)?.read_fixed_array()?;
                    return if sink.extend_fixed(array) {
                        Ok(())
                    } else {
                        Err(DecodeError::InvalidArrayType { found: element })
                    };
                }
                while top(stack)?.current_arg_type() != WireType::Invalid {
                    let mut item = sink.push_element();
                    decode_slot(&mut item, stack, limits)?;
                    top(stack)?.advance()?;
                }
                Ok(())
            })
        }
        Slot::Dict(sink) => {
            if wire != WireType::Array {
                return Err(DecodeError::InvalidDictionaryType { found: wire });
            }
            let element = current.current_element_type();
            if element != WireType::DictEntry {
                return Err(DecodeError::InvalidDictionaryType { found: element });
            }
            sink.clear();
            nested(stack, limits, |stack| {
                while top(stack)?.current_arg_type() == WireType::DictEntry {
                    nested(stack, limits, |stack| decode_entry(&mut **sink, stack, limits))?;
                    top(stack)?.advance()?;
                }
                Ok(())
            })
        }
        Slot::Variant(variant) => {
            if wire != WireType::Variant {
                return Err(DecodeError::InvalidVariantType { found: wire });
            }
            nested(stack, limits, |stack| {
                let signature = top(stack)?.signature().to_string();
                let mut reader = VariantReader::new(stack, *limits);
                if (variant.parse)(&mut reader) {
                    Ok(())
                } else {
                    log::debug!(
                        "[hdbus::decode] variant {:?} rejected: {:?}",
                        signature,
                        reader.error()
                    );
                    Err(DecodeError::InvalidVariantParsing { signature })
                }
            })
        }
        Slot::Ignore | Slot::Bump => Ok(()),
    }
}

fn decode_entry(sink: &mut dyn DictSink, stack: &mut IteratorStack<'_>, limits: &Limits) -> DecodeResult<()> {
    let expected = sink.key_type();
    let entry = top(stack)?;
    let found = entry.current_arg_type();
    if !compatible(expected, found) {
        return Err(DecodeError::InvalidDictionaryKey { expected, found });
    }
    let key = entry.read_basic()?;
    entry.advance()?;
    let Some(mut value) = sink.entry_slot(key) else {
        return Err(DecodeError::InvalidDictionaryKey { expected, found });
    };
    decode_slot(&mut value, stack, limits)
}
