use crate::{
    ast::ast::{NodeId, NodeKind},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{
    parser::Parser,
    stmt::parse_compound_stmt,
    types::{parse_constant, parse_type_spec},
};

/// `program name [( files )] ; block .`
pub fn parse_program(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.expect(TokenKind::Program)?.line;
    let name = parser.expect(TokenKind::Identifier)?;
    let name = parser.builder.decl_name(&name.value, name.line);

    // Program parameters such as `(input, output)` carry no meaning here.
    if parser.accept(TokenKind::OpenParen) {
        parse_name_list(parser)?;
        parser.expect(TokenKind::CloseParen)?;
    }
    parser.expect(TokenKind::Semicolon)?;

    let block = parse_block(parser)?;
    parser.expect(TokenKind::Dot)?;

    Ok(parser
        .builder
        .node(NodeKind::Program, line, vec![name, block]))
}

/// `ident {, ident}` as `DeclName` nodes.
pub fn parse_name_list(parser: &mut Parser) -> Result<Vec<NodeId>, Error> {
    let mut names = vec![];

    loop {
        let token = parser.expect(TokenKind::Identifier)?;
        names.push(parser.builder.decl_name(&token.value, token.line));
        if !parser.accept(TokenKind::Comma) {
            break;
        }
    }

    Ok(names)
}

pub fn parse_block(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.line();
    let mut children = vec![];

    loop {
        match parser.current_token_kind() {
            TokenKind::Const => {
                parser.advance();
                while parser.current_token_kind() == TokenKind::Identifier {
                    children.push(parse_const_decl(parser)?);
                }
            }
            TokenKind::Type => {
                parser.advance();
                while parser.current_token_kind() == TokenKind::Identifier {
                    children.push(parse_type_decl(parser)?);
                }
            }
            TokenKind::Var => {
                parser.advance();
                while parser.current_token_kind() == TokenKind::Identifier {
                    children.push(parse_var_decl(parser)?);
                }
            }
            TokenKind::Procedure | TokenKind::Function => {
                children.push(parse_routine(parser)?);
            }
            _ => break,
        }
    }

    children.push(parse_compound_stmt(parser)?);
    Ok(parser.builder.node(NodeKind::Block, line, children))
}

fn parse_const_decl(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.expect(TokenKind::Identifier)?;
    let name = parser.builder.decl_name(&token.value, token.line);
    parser.expect(TokenKind::Equals)?;
    let value = parse_constant(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(parser
        .builder
        .node(NodeKind::ConstDecl, token.line, vec![name, value]))
}

fn parse_type_decl(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.expect(TokenKind::Identifier)?;
    let name = parser.builder.decl_name(&token.value, token.line);
    parser.expect(TokenKind::Equals)?;
    let spec = parse_type_spec(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(parser
        .builder
        .node(NodeKind::TypeDecl, token.line, vec![name, spec]))
}

fn parse_var_decl(parser: &mut Parser) -> Result<NodeId, Error> {
    let line = parser.line();
    let mut children = parse_name_list(parser)?;
    parser.expect(TokenKind::Colon)?;
    children.push(parse_type_spec(parser)?);
    parser.expect(TokenKind::Semicolon)?;

    Ok(parser.builder.node(NodeKind::VarDecl, line, children))
}

/// `procedure name [( params )] ; block ;` or
/// `function name [( params )] : type ; block ;`
fn parse_routine(parser: &mut Parser) -> Result<NodeId, Error> {
    let header = parser.advance();
    let is_function = header.kind == TokenKind::Function;
    let token = parser.expect(TokenKind::Identifier)?;
    let mut children = vec![parser.builder.decl_name(&token.value, token.line)];

    if parser.accept(TokenKind::OpenParen) {
        loop {
            if parser.current_token_kind() == TokenKind::Var {
                return Err(parser.unexpected("VAR parameters are not supported"));
            }
            let line = parser.line();
            let mut group = parse_name_list(parser)?;
            parser.expect(TokenKind::Colon)?;
            group.push(parse_type_spec(parser)?);
            children.push(parser.builder.node(NodeKind::ParamDecl, line, group));

            if !parser.accept(TokenKind::Semicolon) {
                break;
            }
        }
        parser.expect(TokenKind::CloseParen)?;
    }

    if is_function {
        parser.expect(TokenKind::Colon)?;
        children.push(parse_type_spec(parser)?);
    }
    parser.expect(TokenKind::Semicolon)?;

    children.push(parse_block(parser)?);
    parser.expect(TokenKind::Semicolon)?;

    Ok(parser
        .builder
        .node(NodeKind::Routine { is_function }, header.line, children))
}
