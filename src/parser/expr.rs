use crate::{
    ast::ast::{BinaryOp, Literal, NodeId, NodeKind, UnaryOp},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<NodeId, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_handler(token_kind) {
        Some(nud) => nud,
        None => return Err(parser.unexpected("expected an expression")),
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    while parser.get_binding_power(parser.current_token_kind()) > bp {
        let token_kind = parser.current_token_kind();
        let led = match parser.get_led_handler(token_kind) {
            Some(led) => led,
            None => return Err(parser.unexpected("expected an operator")),
        };

        left = led(parser, left, parser.get_binding_power(token_kind))?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.advance();

    let literal = match token.kind {
        TokenKind::Integer => match token.value.parse::<i32>() {
            Ok(value) => Literal::Integer(value),
            Err(_) => {
                return Err(Error::new(
                    ErrorImpl::NumberParseError { token: token.value },
                    token.line,
                ))
            }
        },
        TokenKind::Real => match token.value.parse::<f64>() {
            Ok(value) => Literal::Real(value),
            Err(_) => {
                return Err(Error::new(
                    ErrorImpl::NumberParseError { token: token.value },
                    token.line,
                ))
            }
        },
        TokenKind::Character => Literal::Char(token.value.chars().next().unwrap_or(' ')),
        TokenKind::String => Literal::Str(token.value.clone()),
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken { token: token.value },
                token.line,
            ))
        }
    };

    Ok(parser.builder.literal(literal, token.line))
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: NodeId,
    bp: BindingPower,
) -> Result<NodeId, Error> {
    let operator_token = parser.advance();

    let operator = match operator_token.kind {
        TokenKind::Equals => BinaryOp::Equals,
        TokenKind::NotEquals => BinaryOp::NotEquals,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEquals => BinaryOp::LessEquals,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEquals => BinaryOp::GreaterEquals,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Dash => BinaryOp::Subtract,
        TokenKind::Or => BinaryOp::Or,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Div => BinaryOp::IntDivide,
        TokenKind::Mod => BinaryOp::Modulo,
        TokenKind::And => BinaryOp::And,
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: operator_token.value,
                },
                operator_token.line,
            ))
        }
    };

    // Relational operators do not chain: `a < b < c` is rejected.
    let right = parse_expr(parser, bp)?;
    if bp == BindingPower::Relational && parser.get_binding_power(parser.current_token_kind()) == bp
    {
        return Err(parser.unexpected("relational operators cannot be chained"));
    }

    Ok(parser.builder.binary(operator, left, right, operator_token.line))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let operator_token = parser.advance();

    let (operator, operand_bp) = match operator_token.kind {
        TokenKind::Dash => (UnaryOp::Negate, BindingPower::Additive),
        TokenKind::Plus => (UnaryOp::Plus, BindingPower::Additive),
        _ => (UnaryOp::Not, BindingPower::Unary),
    };

    let operand = parse_expr(parser, operand_bp)?;
    Ok(parser.builder.unary(operator, operand, operator_token.line))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;
    Ok(expr)
}

/// A variable with its modifiers, a constant, or a function call.
pub fn parse_identifier_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    if parser.peek_kind() == TokenKind::OpenParen {
        let token = parser.advance();
        let args = parse_call_args(parser)?;
        return Ok(parser
            .builder
            .named(NodeKind::FunctionCall, &token.value, token.line, args));
    }

    parse_variable(parser)
}

/// `name { [index, ...] | .field }`
pub fn parse_variable(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.expect(TokenKind::Identifier)?;
    let mut modifiers = vec![];

    loop {
        match parser.current_token_kind() {
            TokenKind::OpenBracket => {
                parser.advance();
                loop {
                    let line = parser.line();
                    let index = parse_expr(parser, BindingPower::Default)?;
                    modifiers.push(parser.builder.node(NodeKind::Index, line, vec![index]));
                    if !parser.accept(TokenKind::Comma) {
                        break;
                    }
                }
                parser.expect(TokenKind::CloseBracket)?;
            }
            TokenKind::Dot if parser.peek_kind() == TokenKind::Identifier => {
                parser.advance();
                let field = parser.advance();
                modifiers.push(
                    parser
                        .builder
                        .named(NodeKind::Field, &field.value, field.line, vec![]),
                );
            }
            _ => break,
        }
    }

    Ok(parser
        .builder
        .named(NodeKind::Variable, &token.value, token.line, modifiers))
}

/// `( expr {, expr} )`, the opening parenthesis being the current token.
pub fn parse_call_args(parser: &mut Parser) -> Result<Vec<NodeId>, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let mut args = vec![];

    if parser.current_token_kind() != TokenKind::CloseParen {
        loop {
            args.push(parse_expr(parser, BindingPower::Default)?);
            if !parser.accept(TokenKind::Comma) {
                break;
            }
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(args)
}
