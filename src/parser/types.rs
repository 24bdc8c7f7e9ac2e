use crate::{
    ast::ast::{NodeId, NodeKind, UnaryOp},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{decl::parse_name_list, expr::parse_primary_expr, parser::Parser};

/// `[+|-] number | identifier | character | string`
pub fn parse_constant(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.line();

    match parser.current_token_kind() {
        TokenKind::Dash | TokenKind::Plus => {
            let sign = parser.advance();
            let operand = parse_unsigned_constant(parser)?;
            if sign.kind == TokenKind::Dash {
                Ok(parser.builder.unary(UnaryOp::Negate, operand, line))
            } else {
                Ok(operand)
            }
        }
        _ => parse_unsigned_constant(parser),
    }
}

fn parse_unsigned_constant(parser: &mut Parser) -> Result<NodeId, Error> {
    match parser.current_token_kind() {
        TokenKind::Identifier => {
            let name = parser.advance();
            Ok(parser
                .builder
                .named(NodeKind::Variable, &name.value, name.line, vec![]))
        }
        TokenKind::Integer | TokenKind::Real | TokenKind::Character | TokenKind::String => {
            parse_primary_expr(parser)
        }
        _ => Err(parser.unexpected("expected a constant")),
    }
}

pub fn parse_type_spec(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.line();

    match parser.current_token_kind() {
        TokenKind::Identifier if parser.peek_kind() != TokenKind::DotDot => {
            let name = parser.advance();
            Ok(parser.builder.type_name(&name.value, name.line))
        }
        TokenKind::OpenParen => {
            parser.advance();
            let names = parse_name_list(parser)?;
            parser.expect(TokenKind::CloseParen)?;
            Ok(parser.builder.node(NodeKind::EnumType, line, names))
        }
        TokenKind::Array => parse_array_type(parser),
        TokenKind::Record => parse_record_type(parser),
        _ => parse_subrange_type(parser),
    }
}

fn parse_subrange_type(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.line();
    let low = parse_constant(parser)?;
    parser.expect(TokenKind::DotDot)?;
    let high = parse_constant(parser)?;

    Ok(parser
        .builder
        .node(NodeKind::SubrangeType, line, vec![low, high]))
}

/// `array [ index {, index} ] of element`, multiple indexes nest.
fn parse_array_type(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.expect(TokenKind::Array)?.line;
    parser.expect(TokenKind::OpenBracket)?;

    let mut indexes = vec![parse_type_spec(parser)?];
    while parser.accept(TokenKind::Comma) {
        indexes.push(parse_type_spec(parser)?);
    }

    parser.expect(TokenKind::CloseBracket)?;
    parser.expect(TokenKind::Of)?;

    let mut element = parse_type_spec(parser)?;
    for index in indexes.into_iter().rev() {
        element = parser
            .builder
            .node(NodeKind::ArrayType, line, vec![index, element]);
    }

    Ok(element)
}

fn parse_record_type(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.expect(TokenKind::Record)?.line;
    let mut fields = vec![];

    while parser.current_token_kind() == TokenKind::Identifier {
        let field_line = parser.line();
        let mut children = parse_name_list(parser)?;
        parser.expect(TokenKind::Colon)?;
        children.push(parse_type_spec(parser)?);
        fields.push(
            parser
                .builder
                .node(NodeKind::FieldDecl, field_line, children),
        );

        if !parser.accept(TokenKind::Semicolon) {
            break;
        }
    }

    parser.expect(TokenKind::End)?;
    Ok(parser.builder.node(NodeKind::RecordType, line, fields))
}
