use crate::{
    ast::ast::{NodeId, NodeKind},
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{
        expr::{parse_call_args, parse_expr, parse_variable},
        lookups::BindingPower,
    },
};

use super::{parser::Parser, types::parse_constant};

pub fn parse_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    match parser.get_stmt_handler(parser.current_token_kind()) {
        Some(handler) => handler(parser),
        None => {
            // Empty statement before `;`, `end`, `until` or `else`.
            let line = parser.line();
            Ok(parser.builder.node(NodeKind::Empty, line, vec![]))
        }
    }
}

/// `stmt { ; stmt }` up to (not including) any of `terminators`.
pub fn parse_stmt_list(
    parser: &mut Parser,
    terminators: &[TokenKind],
) -> Result<Vec<NodeId>, Error> {
    let mut statements = vec![];

    loop {
        let stmt = parse_stmt(parser)?;
        if parser.builder.tree().kind(stmt) != NodeKind::Empty {
            statements.push(stmt);
        }

        if parser.accept(TokenKind::Semicolon) {
            continue;
        }
        if terminators.contains(&parser.current_token_kind()) {
            break;
        }
        return Err(parser.unexpected("expected `;` between statements"));
    }

    Ok(statements)
}

pub fn parse_compound_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let begin = parser.expect(TokenKind::Begin)?;
    let statements = parse_stmt_list(parser, &[TokenKind::End])?;
    parser.expect(TokenKind::End)?;

    Ok(parser
        .builder
        .node(NodeKind::Compound, begin.line, statements))
}

/// Assignment or procedure call.
pub fn parse_identifier_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.line();

    match parser.peek_kind() {
        TokenKind::OpenParen => {
            let name = parser.advance();
            let args = parse_call_args(parser)?;
            Ok(parser
                .builder
                .named(NodeKind::ProcCall, &name.value, line, args))
        }
        TokenKind::Semicolon | TokenKind::End | TokenKind::Until | TokenKind::Else => {
            let name = parser.advance();
            Ok(parser
                .builder
                .named(NodeKind::ProcCall, &name.value, line, vec![]))
        }
        _ => {
            let target = parse_variable(parser)?;
            let assign = parser.expect(TokenKind::ColonEquals)?;
            let value = parse_expr(parser, BindingPower::Default)?;
            Ok(parser.builder.assign(target, value, assign.line))
        }
    }
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.expect(TokenKind::If)?.line;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Then)?;
    let then_branch = parse_stmt(parser)?;

    let mut children = vec![condition, then_branch];
    if parser.accept(TokenKind::Else) {
        children.push(parse_stmt(parser)?);
    }

    Ok(parser.builder.node(NodeKind::If, line, children))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.expect(TokenKind::While)?.line;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Do)?;
    let body = parse_stmt(parser)?;

    Ok(parser
        .builder
        .node(NodeKind::While, line, vec![condition, body]))
}

pub fn parse_repeat_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.expect(TokenKind::Repeat)?.line;
    let mut children = parse_stmt_list(parser, &[TokenKind::Until])?;
    parser.expect(TokenKind::Until)?;
    children.push(parse_expr(parser, BindingPower::Default)?);

    Ok(parser.builder.node(NodeKind::Repeat, line, children))
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.expect(TokenKind::For)?.line;
    let control = parse_variable(parser)?;
    parser.expect(TokenKind::ColonEquals)?;
    let initial = parse_expr(parser, BindingPower::Default)?;

    let downto = match parser.current_token_kind() {
        TokenKind::To => false,
        TokenKind::Downto => true,
        _ => return Err(parser.unexpected("expected `to` or `downto`")),
    };
    parser.advance();

    let bound = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Do)?;
    let body = parse_stmt(parser)?;

    Ok(parser.builder.node(
        NodeKind::For { downto },
        line,
        vec![control, initial, bound, body],
    ))
}

pub fn parse_case_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.expect(TokenKind::Case)?.line;
    let selector = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Of)?;

    let mut children = vec![selector];

    while !matches!(
        parser.current_token_kind(),
        TokenKind::End | TokenKind::Else | TokenKind::Otherwise
    ) {
        let branch_line = parser.line();
        let mut branch = vec![];
        loop {
            branch.push(parse_constant(parser)?);
            if !parser.accept(TokenKind::Comma) {
                break;
            }
        }
        parser.expect(TokenKind::Colon)?;
        branch.push(parse_stmt(parser)?);
        children.push(
            parser
                .builder
                .node(NodeKind::CaseBranch, branch_line, branch),
        );

        if !parser.accept(TokenKind::Semicolon) {
            break;
        }
    }

    if matches!(
        parser.current_token_kind(),
        TokenKind::Else | TokenKind::Otherwise
    ) {
        let else_line = parser.advance().line;
        let statements = parse_stmt_list(parser, &[TokenKind::End])?;
        let body = parser
            .builder
            .node(NodeKind::Compound, else_line, statements);
        children.push(parser.builder.node(NodeKind::CaseElse, else_line, vec![body]));
    }

    parser.expect(TokenKind::End)?;
    Ok(parser.builder.node(NodeKind::Case, line, children))
}

pub fn parse_write_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.advance();
    let newline = token.kind == TokenKind::Writeln;
    let mut args = vec![];

    if parser.accept(TokenKind::OpenParen) {
        loop {
            let arg_line = parser.line();
            let mut arg = vec![parse_expr(parser, BindingPower::Default)?];
            if parser.accept(TokenKind::Colon) {
                arg.push(parse_expr(parser, BindingPower::Default)?);
                if parser.accept(TokenKind::Colon) {
                    arg.push(parse_expr(parser, BindingPower::Default)?);
                }
            }
            args.push(parser.builder.node(NodeKind::WriteArg, arg_line, arg));

            if !parser.accept(TokenKind::Comma) {
                break;
            }
        }
        parser.expect(TokenKind::CloseParen)?;
    }

    Ok(parser
        .builder
        .node(NodeKind::Write { newline }, token.line, args))
}

pub fn parse_read_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.advance();
    let newline = token.kind == TokenKind::Readln;
    let mut targets = vec![];

    if parser.accept(TokenKind::OpenParen) {
        loop {
            targets.push(parse_variable(parser)?);
            if !parser.accept(TokenKind::Comma) {
                break;
            }
        }
        parser.expect(TokenKind::CloseParen)?;
    }

    Ok(parser
        .builder
        .node(NodeKind::Read { newline }, token.line, targets))
}
