use crate::ast::{BinaryOp, ConvertTarget, UnaryOp};
use crate::error::{MmtError, Span};
use crate::value::Value;

/// Operands of an arithmetic operator after promotion: both stay integers
/// only when both started as integers.
enum Numeric {
    Int(i64, i64),
    Float(f64, f64),
}

fn promote(left: &Value, right: &Value) -> Option<Numeric> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(Numeric::Int(*a, *b)),
        (Value::Int(a), Value::Float(b)) => Some(Numeric::Float(*a as f64, *b)),
        (Value::Float(a), Value::Int(b)) => Some(Numeric::Float(*a, *b as f64)),
        (Value::Float(a), Value::Float(b)) => Some(Numeric::Float(*a, *b)),
        _ => None,
    }
}

/// Integer view of a value for the bitwise and logical operators, which
/// accept booleans as 0/1.
fn as_bits(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn unsupported(operator: BinaryOp, left: &Value, right: &Value, span: Span) -> MmtError {
    MmtError::runtime_error(
        span,
        format!(
            "Cannot apply '{}' to {} and {}",
            operator.as_symbol(),
            left.describe(),
            right.describe()
        ),
    )
}

fn overflow(operator: BinaryOp, span: Span) -> MmtError {
    MmtError::runtime_error(span, format!("Integer overflow in '{}'", operator.as_symbol()))
}

fn division_by_zero(operator: BinaryOp, span: Span) -> MmtError {
    MmtError::runtime_error_with_help(
        span,
        "Division by zero".to_string(),
        format!("The right operand of '{}' evaluated to zero.", operator.as_symbol()),
    )
}

pub fn binary(operator: BinaryOp, left: &Value, right: &Value, span: Span) -> Result<Value, MmtError> {
    match operator {
        BinaryOp::Equal => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => return Ok(Value::Bool(left != right)),
        BinaryOp::Add => {
            if let Some(result) = add_containers(left, right) {
                return Ok(result);
            }
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => return bitwise(operator, left, right, span),
        BinaryOp::And | BinaryOp::Or => return logical(operator, left, right, span),
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => return shift(operator, left, right, span),
        _ => {}
    }

    let numbers = promote(left, right).ok_or_else(|| unsupported(operator, left, right, span))?;
    match numbers {
        Numeric::Int(a, b) => integer_arithmetic(operator, a, b, span),
        Numeric::Float(a, b) => float_arithmetic(operator, a, b, span),
    }
}

/// `+` on strings, arrays and objects. Always builds a new value.
fn add_containers(left: &Value, right: &Value) -> Option<Value> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(Value::String(format!("{}{}", a, b))),
        (Value::Array(a), Value::Array(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Some(Value::array(items))
        }
        (Value::Object(a), Value::Object(b)) => {
            let mut entries = a.borrow().clone();
            for (key, value) in b.borrow().iter() {
                entries.insert(key.clone(), value.clone());
            }
            Some(Value::object(entries))
        }
        _ => None,
    }
}

fn integer_arithmetic(operator: BinaryOp, a: i64, b: i64, span: Span) -> Result<Value, MmtError> {
    let result = match operator {
        BinaryOp::Add => a.checked_add(b).ok_or_else(|| overflow(operator, span))?,
        BinaryOp::Subtract => a.checked_sub(b).ok_or_else(|| overflow(operator, span))?,
        BinaryOp::Multiply => a.checked_mul(b).ok_or_else(|| overflow(operator, span))?,
        BinaryOp::FloorDivide => {
            if b == 0 {
                return Err(division_by_zero(operator, span));
            }
            let quotient = a.checked_div(b).ok_or_else(|| overflow(operator, span))?;
            if (a % b != 0) && ((a < 0) != (b < 0)) {
                quotient - 1
            } else {
                quotient
            }
        }
        BinaryOp::Modulo => {
            if b == 0 {
                return Err(division_by_zero(operator, span));
            }
            a.checked_rem(b).ok_or_else(|| overflow(operator, span))?
        }
        BinaryOp::Greater => return Ok(Value::Bool(a > b)),
        BinaryOp::Less => return Ok(Value::Bool(a < b)),
        BinaryOp::GreaterEqual => return Ok(Value::Bool(a >= b)),
        BinaryOp::LessEqual => return Ok(Value::Bool(a <= b)),
        // The remaining operators always produce floats.
        _ => return float_arithmetic(operator, a as f64, b as f64, span),
    };
    Ok(Value::Int(result))
}

fn float_arithmetic(operator: BinaryOp, a: f64, b: f64, span: Span) -> Result<Value, MmtError> {
    let result = match operator {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide | BinaryOp::FloorDivide | BinaryOp::Modulo if b == 0.0 => {
            return Err(division_by_zero(operator, span));
        }
        BinaryOp::Divide => a / b,
        BinaryOp::FloorDivide => (a / b).floor(),
        BinaryOp::Modulo => a % b,
        BinaryOp::Power => a.powf(b),
        BinaryOp::Root => {
            if a == 0.0 {
                return Err(MmtError::runtime_error(
                    span,
                    "Root degree must not be zero".to_string(),
                ));
            }
            b.powf(1.0 / a)
        }
        BinaryOp::Greater => return Ok(Value::Bool(a > b)),
        BinaryOp::Less => return Ok(Value::Bool(a < b)),
        BinaryOp::GreaterEqual => return Ok(Value::Bool(a >= b)),
        BinaryOp::LessEqual => return Ok(Value::Bool(a <= b)),
        _ => {
            return Err(unsupported(operator, &Value::Float(a), &Value::Float(b), span));
        }
    };
    Ok(Value::Float(result))
}

fn shift(operator: BinaryOp, left: &Value, right: &Value, span: Span) -> Result<Value, MmtError> {
    let (Value::Int(a), Value::Int(b)) = (left, right) else {
        return Err(unsupported(operator, left, right, span));
    };
    let amount = u32::try_from(*b)
        .ok()
        .filter(|amount| *amount < i64::BITS)
        .ok_or_else(|| {
            MmtError::runtime_error(span, format!("Shift amount {} is out of range 0..64", b))
        })?;
    let result = match operator {
        BinaryOp::ShiftLeft => a.wrapping_shl(amount),
        _ => a.wrapping_shr(amount),
    };
    Ok(Value::Int(result))
}

fn bitwise(operator: BinaryOp, left: &Value, right: &Value, span: Span) -> Result<Value, MmtError> {
    if let (Value::Bool(a), Value::Bool(b)) = (left, right) {
        let result = match operator {
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitOr => a | b,
            _ => a ^ b,
        };
        return Ok(Value::Bool(result));
    }

    let (Some(a), Some(b)) = (as_bits(left), as_bits(right)) else {
        return Err(unsupported(operator, left, right, span));
    };
    let result = match operator {
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        _ => a ^ b,
    };
    Ok(Value::Int(result))
}

fn logical(operator: BinaryOp, left: &Value, right: &Value, span: Span) -> Result<Value, MmtError> {
    let (Some(a), Some(b)) = (as_bits(left), as_bits(right)) else {
        return Err(unsupported(operator, left, right, span));
    };
    let result = match operator {
        BinaryOp::And => a != 0 && b != 0,
        _ => a != 0 || b != 0,
    };
    Ok(Value::Bool(result))
}

/// `ไม่`, `!` and unary minus. The stepping operators need write access to
/// the operand and live in the evaluator.
pub fn unary(operator: UnaryOp, operand: &Value, span: Span) -> Result<Value, MmtError> {
    let result = match (operator, operand) {
        (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
        (UnaryOp::Not, Value::Int(n)) => Value::Bool(*n == 0),
        (UnaryOp::Not, Value::Float(n)) => Value::Bool(*n == 0.0),
        (UnaryOp::BitNot, Value::Int(n)) => Value::Int(!n),
        (UnaryOp::BitNot, Value::Bool(b)) => Value::Int(!i64::from(*b)),
        (UnaryOp::Negate, Value::Int(n)) => Value::Int(
            n.checked_neg()
                .ok_or_else(|| MmtError::runtime_error(span, "Integer overflow in '-'".to_string()))?,
        ),
        (UnaryOp::Negate, Value::Float(n)) => Value::Float(-n),
        _ => {
            return Err(MmtError::runtime_error(
                span,
                format!("Cannot apply '{}' to {}", operator.as_symbol(), operand.describe()),
            ))
        }
    };
    Ok(result)
}

/// Adds `delta` to an integer operand of `++`/`--`.
pub fn step(operator: UnaryOp, operand: &Value, delta: i64, span: Span) -> Result<Value, MmtError> {
    match operand {
        Value::Int(n) => n
            .checked_add(delta)
            .map(Value::Int)
            .ok_or_else(|| MmtError::runtime_error(span, format!("Integer overflow in '{}'", operator.as_symbol()))),
        _ => Err(MmtError::runtime_error(
            span,
            format!("Cannot apply '{}' to {}", operator.as_symbol(), operand.describe()),
        )),
    }
}

pub fn natural_log(operand: &Value, span: Span) -> Result<Value, MmtError> {
    match operand {
        Value::Int(n) => Ok(Value::Float((*n as f64).ln())),
        Value::Float(n) => Ok(Value::Float(n.ln())),
        _ => Err(MmtError::runtime_error(
            span,
            format!("Cannot take the natural logarithm of {}", operand.describe()),
        )),
    }
}

pub fn convert(value: &Value, target: ConvertTarget, span: Span) -> Result<Value, MmtError> {
    let converted = match (target, value) {
        (ConvertTarget::Integer, Value::Int(n)) => Some(Value::Int(*n)),
        (ConvertTarget::Integer, Value::Bool(b)) => Some(Value::Int(i64::from(*b))),
        (ConvertTarget::Integer, Value::Float(n)) => {
            let truncated = n.trunc();
            if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Some(Value::Int(truncated as i64))
            } else {
                None
            }
        }
        (ConvertTarget::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::Int),

        (ConvertTarget::Float, Value::Float(n)) => Some(Value::Float(*n)),
        (ConvertTarget::Float, Value::Int(n)) => Some(Value::Float(*n as f64)),
        (ConvertTarget::Float, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::Float),

        (ConvertTarget::String, Value::String(s)) => Some(Value::String(s.clone())),
        (ConvertTarget::String, Value::Int(_) | Value::Float(_)) => Some(Value::String(value.to_string())),

        (ConvertTarget::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
        (ConvertTarget::Boolean, Value::Int(n)) => Some(Value::Bool(*n != 0)),

        _ => None,
    };

    converted.ok_or_else(|| {
        MmtError::runtime_error(
            span,
            format!("Cannot convert {} to {}", value.describe(), target.keyword()),
        )
    })
}
