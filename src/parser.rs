//! Parser for ECMAScript 3 source code
//!
//! Recursive descent for statements, precedence climbing for binary
//! operators. Early errors (misplaced `return`/`break`/`continue`, unknown or
//! duplicate labels, invalid assignment targets) are reported here, before any
//! code runs.

use std::rc::Rc;

use crate::ast::*;
use crate::error::{JsError, SourceLocation};
use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::stack::ensure_sufficient_stack;
use crate::string_dict::StringDict;
use crate::value::{JsString, number_to_string};

struct LabelEntry {
    name: JsString,
    is_loop: bool,
}

/// Parse state local to one function body (or the program).
#[derive(Default)]
struct CodeScope {
    declarations: Declarations,
    labels: Vec<LabelEntry>,
    /// Labels that directly prefix the statement about to be parsed
    pending_labels: usize,
    iteration_depth: usize,
    switch_depth: usize,
    in_function: bool,
}

/// Parser for ECMAScript source code
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    source: &'a str,
    source_id: SourceId,
    current: Token,
    previous: Token,
    scope: CodeScope,
    /// Cleared while parsing a `for` initializer
    in_allowed: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, string_dict: &'a mut StringDict, source_id: SourceId) -> Self {
        let mut lexer = Lexer::new(source, string_dict);
        let current = lexer.next_token();
        Self {
            lexer,
            source,
            source_id,
            current,
            previous: Token::eof(0, 1, 1),
            scope: CodeScope::default(),
            in_allowed: true,
        }
    }

    #[inline]
    fn intern(&mut self, s: &str) -> JsString {
        self.lexer.string_dict().get_or_insert(s)
    }

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program, JsError> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        let scope = std::mem::take(&mut self.scope);
        Ok(Program {
            body,
            declarations: scope.declarations,
            source_id: self.source_id,
        })
    }

    // ============ STATEMENTS ============

    fn parse_statement(&mut self) -> Result<Statement, JsError> {
        ensure_sufficient_stack(|| self.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Result<Statement, JsError> {
        let pending = std::mem::take(&mut self.scope_mut().pending_labels);
        if matches!(
            self.current.kind,
            TokenKind::For | TokenKind::While | TokenKind::Do
        ) {
            let scope = self.scope_mut();
            let len = scope.labels.len();
            for entry in scope.labels.iter_mut().skip(len.saturating_sub(pending)) {
                entry.is_loop = true;
            }
        }

        let start = self.current.span;
        let kind = match &self.current.kind {
            TokenKind::LBrace => StatementKind::Block(self.parse_block()?),
            TokenKind::Var => {
                self.advance();
                let declarations = self.parse_variable_declarators()?;
                self.expect_semicolon()?;
                StatementKind::Var(declarations)
            }
            TokenKind::Semicolon => {
                self.advance();
                StatementKind::Empty
            }
            TokenKind::If => self.parse_if_statement()?,
            TokenKind::Do => self.parse_do_while_statement()?,
            TokenKind::While => self.parse_while_statement()?,
            TokenKind::For => self.parse_for_statement()?,
            TokenKind::Continue => self.parse_continue_statement()?,
            TokenKind::Break => self.parse_break_statement()?,
            TokenKind::Return => self.parse_return_statement()?,
            TokenKind::With => self.parse_with_statement()?,
            TokenKind::Switch => self.parse_switch_statement()?,
            TokenKind::Throw => self.parse_throw_statement()?,
            TokenKind::Try => self.parse_try_statement()?,
            TokenKind::Function => {
                let function = self.parse_function(true)?;
                self.scope_mut()
                    .declarations
                    .functions
                    .push(function.clone());
                StatementKind::FunctionDeclaration(function)
            }
            _ => {
                let expression = self.parse_expression()?;
                if let ExpressionKind::Identifier(label) = &expression.kind {
                    if self.check(&TokenKind::Colon) {
                        let label = label.clone();
                        self.advance();
                        return self.parse_labeled_statement(label, start, pending);
                    }
                }
                self.expect_semicolon()?;
                StatementKind::Expression(expression)
            }
        };

        Ok(Statement {
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>, JsError> {
        self.require_token(&TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.unexpected_token("'}'"));
            }
            body.push(self.parse_statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn parse_variable_declarators(&mut self) -> Result<Vec<VariableDeclarator>, JsError> {
        let mut declarations = vec![self.parse_variable_declarator()?];
        while self.match_token(&TokenKind::Comma) {
            declarations.push(self.parse_variable_declarator()?);
        }
        Ok(declarations)
    }

    fn parse_variable_declarator(&mut self) -> Result<VariableDeclarator, JsError> {
        let start = self.current.span;
        let name = self.parse_identifier()?;
        self.scope_mut().declarations.add_var(&name);
        let init = if self.match_token(&TokenKind::Eq) {
            Some(self.parse_assignment_expression()?)
        } else {
            None
        };
        Ok(VariableDeclarator {
            name,
            init,
            span: self.span_from(start),
        })
    }

    fn parse_if_statement(&mut self) -> Result<StatementKind, JsError> {
        self.advance();
        let test = self.parse_parenthesized()?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.match_token(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StatementKind::If {
            test,
            consequent,
            alternate,
        })
    }

    fn parse_do_while_statement(&mut self) -> Result<StatementKind, JsError> {
        self.advance();
        let body = Box::new(self.parse_loop_body()?);
        self.require_token(&TokenKind::While)?;
        let test = self.parse_parenthesized()?;
        // `do ... while (x)` may omit the semicolon even on the same line
        self.match_token(&TokenKind::Semicolon);
        Ok(StatementKind::DoWhile { body, test })
    }

    fn parse_while_statement(&mut self) -> Result<StatementKind, JsError> {
        self.advance();
        let test = self.parse_parenthesized()?;
        let body = Box::new(self.parse_loop_body()?);
        Ok(StatementKind::While { test, body })
    }

    fn parse_for_statement(&mut self) -> Result<StatementKind, JsError> {
        self.advance();
        self.require_token(&TokenKind::LParen)?;

        let init = if self.match_token(&TokenKind::Var) {
            let mut declarations =
                self.with_in_allowed(false, |p| p.parse_variable_declarators())?;
            if declarations.len() == 1 && self.match_token(&TokenKind::In) {
                if let Some(declarator) = declarations.pop() {
                    return self.parse_for_in_rest(ForInTarget::Var(declarator));
                }
            }
            Some(ForInit::Var(declarations))
        } else if self.check(&TokenKind::Semicolon) {
            None
        } else {
            let expression = self.with_in_allowed(false, |p| p.parse_expression())?;
            if self.match_token(&TokenKind::In) {
                if !expression.kind.is_reference() {
                    return Err(JsError::reference_error(
                        "Invalid left-hand side in for-in",
                    ));
                }
                return self.parse_for_in_rest(ForInTarget::Expression(expression));
            }
            Some(ForInit::Expression(expression))
        };

        self.require_token(&TokenKind::Semicolon)?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.require_token(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.require_token(&TokenKind::RParen)?;
        let body = Box::new(self.parse_loop_body()?);

        Ok(StatementKind::For {
            init,
            test,
            update,
            body,
        })
    }

    fn parse_for_in_rest(&mut self, target: ForInTarget) -> Result<StatementKind, JsError> {
        let object = self.parse_expression()?;
        self.require_token(&TokenKind::RParen)?;
        let body = Box::new(self.parse_loop_body()?);
        Ok(StatementKind::ForIn {
            target,
            object,
            body,
        })
    }

    fn parse_loop_body(&mut self) -> Result<Statement, JsError> {
        self.scope_mut().iteration_depth += 1;
        let body = self.parse_statement();
        self.scope_mut().iteration_depth -= 1;
        body
    }

    fn parse_continue_statement(&mut self) -> Result<StatementKind, JsError> {
        let keyword = self.current.span;
        self.advance();
        let label = self.parse_jump_label()?;
        let scope = self.scope();
        match &label {
            Some(name) => {
                let found = scope.labels.iter().rev().find(|entry| &entry.name == name);
                match found {
                    Some(entry) if entry.is_loop => {}
                    Some(_) => {
                        return Err(self.error_at(
                            &format!("Label '{}' does not denote an iteration statement", name),
                            keyword,
                        ));
                    }
                    None => {
                        return Err(self.error_at(&format!("Undefined label '{}'", name), keyword));
                    }
                }
            }
            None if scope.iteration_depth == 0 => {
                return Err(self.error_at("Illegal continue statement", keyword));
            }
            None => {}
        }
        self.expect_semicolon()?;
        Ok(StatementKind::Continue(label))
    }

    fn parse_break_statement(&mut self) -> Result<StatementKind, JsError> {
        let keyword = self.current.span;
        self.advance();
        let label = self.parse_jump_label()?;
        let scope = self.scope();
        match &label {
            Some(name) if !scope.labels.iter().any(|entry| &entry.name == name) => {
                return Err(self.error_at(&format!("Undefined label '{}'", name), keyword));
            }
            None if scope.iteration_depth == 0 && scope.switch_depth == 0 => {
                return Err(self.error_at("Illegal break statement", keyword));
            }
            _ => {}
        }
        self.expect_semicolon()?;
        Ok(StatementKind::Break(label))
    }

    /// Optional label after `break`/`continue`; a line terminator ends the statement.
    fn parse_jump_label(&mut self) -> Result<Option<JsString>, JsError> {
        if self.lexer.had_newline_before() {
            return Ok(None);
        }
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            return Ok(Some(name));
        }
        Ok(None)
    }

    fn parse_return_statement(&mut self) -> Result<StatementKind, JsError> {
        let keyword = self.current.span;
        if !self.scope().in_function {
            return Err(self.error_at("Return statement outside of function", keyword));
        }
        self.advance();
        let argument = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon()?;
        Ok(StatementKind::Return(argument))
    }

    fn parse_with_statement(&mut self) -> Result<StatementKind, JsError> {
        self.advance();
        let object = self.parse_parenthesized()?;
        let body = Box::new(self.parse_statement()?);
        Ok(StatementKind::With { object, body })
    }

    fn parse_switch_statement(&mut self) -> Result<StatementKind, JsError> {
        self.advance();
        let discriminant = self.parse_parenthesized()?;
        self.require_token(&TokenKind::LBrace)?;
        self.scope_mut().switch_depth += 1;

        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.match_token(&TokenKind::RBrace) {
            let test = if self.match_token(&TokenKind::Case) {
                Some(self.parse_expression()?)
            } else if self.check(&TokenKind::Default) {
                if seen_default {
                    return Err(self.error("More than one default clause in switch statement"));
                }
                self.advance();
                seen_default = true;
                None
            } else {
                return Err(self.unexpected_token("'case', 'default' or '}'"));
            };
            self.require_token(&TokenKind::Colon)?;

            let mut body = Vec::new();
            while !matches!(
                self.current.kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                body.push(self.parse_statement()?);
            }
            if self.is_at_end() {
                return Err(self.unexpected_token("'}'"));
            }
            cases.push(SwitchCase { test, body });
        }

        self.scope_mut().switch_depth -= 1;
        Ok(StatementKind::Switch {
            discriminant,
            cases,
        })
    }

    fn parse_throw_statement(&mut self) -> Result<StatementKind, JsError> {
        let keyword = self.current.span;
        self.advance();
        if self.lexer.had_newline_before() {
            return Err(self.error_at("Illegal newline after throw", keyword));
        }
        let argument = self.parse_expression()?;
        self.expect_semicolon()?;
        Ok(StatementKind::Throw(argument))
    }

    fn parse_try_statement(&mut self) -> Result<StatementKind, JsError> {
        self.advance();
        let block = self.parse_block()?;

        let handler = if self.match_token(&TokenKind::Catch) {
            self.require_token(&TokenKind::LParen)?;
            let param = self.parse_identifier()?;
            self.require_token(&TokenKind::RParen)?;
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.match_token(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }

        Ok(StatementKind::Try {
            block,
            handler,
            finalizer,
        })
    }

    fn parse_labeled_statement(
        &mut self,
        label: JsString,
        start: Span,
        pending: usize,
    ) -> Result<Statement, JsError> {
        if self.scope().labels.iter().any(|entry| entry.name == label) {
            return Err(self.error_at(&format!("Label '{}' has already been declared", label), start));
        }
        let scope = self.scope_mut();
        scope.labels.push(LabelEntry {
            name: label.clone(),
            is_loop: false,
        });
        scope.pending_labels = pending + 1;

        let body = self.parse_statement();
        self.scope_mut().labels.pop();
        let body = Box::new(body?);

        Ok(Statement {
            kind: StatementKind::Labeled { label, body },
            span: self.span_from(start),
        })
    }

    // ============ FUNCTIONS ============

    /// Parse `function name?(params) { body }` starting at the `function` keyword.
    fn parse_function(&mut self, is_declaration: bool) -> Result<Rc<FunctionData>, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::Function)?;

        let name = if is_declaration || matches!(self.current.kind, TokenKind::Identifier(_)) {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        self.require_token(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.parse_identifier()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.require_token(&TokenKind::RParen)?;

        let saved_in = std::mem::replace(&mut self.in_allowed, true);
        let outer = std::mem::replace(
            &mut self.scope,
            CodeScope {
                in_function: true,
                ..CodeScope::default()
            },
        );
        let body = self.parse_block();
        let scope = std::mem::replace(&mut self.scope, outer);
        self.in_allowed = saved_in;
        let body = body?;

        let span = self.span_from(start);
        let text = self.source.get(span.start..span.end).unwrap_or("");
        let source_text = JsString::from(text);

        Ok(Rc::new(FunctionData {
            name,
            params,
            body,
            declarations: scope.declarations,
            span,
            source_id: self.source_id,
            source_text,
        }))
    }

    // ============ EXPRESSIONS ============

    fn parse_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let first = self.parse_assignment_expression()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.match_token(&TokenKind::Comma) {
            expressions.push(self.parse_assignment_expression()?);
        }
        Ok(Expression {
            kind: ExpressionKind::Sequence(expressions),
            span: self.span_from(start),
        })
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let target = self.parse_conditional_expression()?;

        let Some(op) = self.current_assignment_op() else {
            return Ok(target);
        };
        if !target.kind.is_reference() {
            return Err(JsError::reference_error(
                "Invalid left-hand side in assignment",
            ));
        }
        self.advance();
        let value = self.parse_assignment_expression()?;

        Ok(Expression {
            kind: ExpressionKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            span: self.span_from(start),
        })
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let test = self.parse_binary_expression(0)?;

        if self.match_token(&TokenKind::Question) {
            let consequent = self.with_in_allowed(true, |p| p.parse_assignment_expression())?;
            self.require_token(&TokenKind::Colon)?;
            let alternate = self.parse_assignment_expression()?;
            return Ok(Expression {
                kind: ExpressionKind::Conditional {
                    test: Box::new(test),
                    consequent: Box::new(consequent),
                    alternate: Box::new(alternate),
                },
                span: self.span_from(start),
            });
        }

        Ok(test)
    }

    /// Precedence climbing over binary and logical operators
    fn parse_binary_expression(&mut self, min_prec: u8) -> Result<Expression, JsError> {
        let start = self.current.span;
        let mut left = self.parse_unary_expression()?;

        while let Some((op, prec)) = self.current_binary_op() {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary_expression(prec + 1)?;

            let kind = match op {
                BinaryOrLogical::Binary(op) => ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                BinaryOrLogical::Logical(op) => ExpressionKind::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
            left = Expression {
                kind,
                span: self.span_from(start),
            };
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, JsError> {
        ensure_sufficient_stack(|| self.parse_unary_expression_inner())
    }

    fn parse_unary_expression_inner(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;

        if let Some(op) = self.current_unary_op() {
            self.advance();
            let argument = Box::new(self.parse_unary_expression()?);
            return Ok(Expression {
                kind: ExpressionKind::Unary { op, argument },
                span: self.span_from(start),
            });
        }

        if let Some(op) = self.current_update_op() {
            self.advance();
            let argument = self.parse_unary_expression()?;
            if !argument.kind.is_reference() {
                return Err(JsError::reference_error(
                    "Invalid left-hand side expression in prefix operation",
                ));
            }
            return Ok(Expression {
                kind: ExpressionKind::Update {
                    op,
                    prefix: true,
                    argument: Box::new(argument),
                },
                span: self.span_from(start),
            });
        }

        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let expr = self.parse_left_hand_side_expression()?;

        if self.lexer.had_newline_before() {
            return Ok(expr);
        }
        let Some(op) = self.current_update_op() else {
            return Ok(expr);
        };
        if !expr.kind.is_reference() {
            return Err(JsError::reference_error(
                "Invalid left-hand side expression in postfix operation",
            ));
        }
        self.advance();
        Ok(Expression {
            kind: ExpressionKind::Update {
                op,
                prefix: false,
                argument: Box::new(expr),
            },
            span: self.span_from(start),
        })
    }

    fn parse_left_hand_side_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let mut expr = self.parse_new_or_member_expression()?;

        loop {
            expr = match self.current.kind {
                TokenKind::LParen => {
                    let arguments = self.parse_arguments()?;
                    Expression {
                        kind: ExpressionKind::Call {
                            callee: Box::new(expr),
                            arguments,
                        },
                        span: self.span_from(start),
                    }
                }
                TokenKind::Dot | TokenKind::LBracket => self.parse_member_suffix(expr, start)?,
                _ => break,
            };
        }

        Ok(expr)
    }

    fn parse_new_or_member_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;

        let mut expr = if self.match_token(&TokenKind::New) {
            let callee = self.parse_new_or_member_expression()?;
            let arguments = if self.check(&TokenKind::LParen) {
                self.parse_arguments()?
            } else {
                Vec::new()
            };
            Expression {
                kind: ExpressionKind::New {
                    callee: Box::new(callee),
                    arguments,
                },
                span: self.span_from(start),
            }
        } else {
            self.parse_primary_expression()?
        };

        while matches!(self.current.kind, TokenKind::Dot | TokenKind::LBracket) {
            expr = self.parse_member_suffix(expr, start)?;
        }
        Ok(expr)
    }

    fn parse_member_suffix(&mut self, object: Expression, start: Span) -> Result<Expression, JsError> {
        let property = if self.match_token(&TokenKind::Dot) {
            MemberProperty::Dot(self.parse_identifier_name()?)
        } else {
            self.require_token(&TokenKind::LBracket)?;
            let property = self.with_in_allowed(true, |p| p.parse_expression())?;
            self.require_token(&TokenKind::RBracket)?;
            MemberProperty::Computed(Box::new(property))
        };
        Ok(Expression {
            kind: ExpressionKind::Member {
                object: Box::new(object),
                property,
            },
            span: self.span_from(start),
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, JsError> {
        self.require_token(&TokenKind::LParen)?;
        self.with_in_allowed(true, |p| {
            let mut arguments = Vec::new();
            if !p.check(&TokenKind::RParen) {
                loop {
                    arguments.push(p.parse_assignment_expression()?);
                    if !p.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            p.require_token(&TokenKind::RParen)?;
            Ok(arguments)
        })
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let kind = match &self.current.kind {
            TokenKind::This => {
                self.advance();
                ExpressionKind::This
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                ExpressionKind::Identifier(name)
            }
            TokenKind::Null => {
                self.advance();
                ExpressionKind::Null
            }
            TokenKind::True => {
                self.advance();
                ExpressionKind::Boolean(true)
            }
            TokenKind::False => {
                self.advance();
                ExpressionKind::Boolean(false)
            }
            TokenKind::Number(n) => {
                let n = *n;
                self.advance();
                ExpressionKind::Number(n)
            }
            TokenKind::String(s) => {
                let s = s.clone();
                self.advance();
                ExpressionKind::String(s)
            }
            TokenKind::LParen => {
                self.advance();
                let expression = self.with_in_allowed(true, |p| p.parse_expression())?;
                self.require_token(&TokenKind::RParen)?;
                // Keep the inner node; grouping has no runtime meaning in ES3
                return Ok(expression);
            }
            TokenKind::LBracket => self.parse_array_literal()?,
            TokenKind::LBrace => self.parse_object_literal()?,
            TokenKind::Function => ExpressionKind::Function(self.parse_function(false)?),
            TokenKind::Slash | TokenKind::SlashEq => {
                return Err(self.error("Regular expression literals are not supported"));
            }
            TokenKind::Reserved(word) => {
                return Err(self.error(&format!("Unexpected reserved word '{}'", word)));
            }
            _ => return Err(self.unexpected_token("expression")),
        };

        Ok(Expression {
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_array_literal(&mut self) -> Result<ExpressionKind, JsError> {
        self.require_token(&TokenKind::LBracket)?;
        self.with_in_allowed(true, |p| {
            let mut elements = Vec::new();
            loop {
                match p.current.kind {
                    TokenKind::RBracket => {
                        p.advance();
                        return Ok(ExpressionKind::Array(elements));
                    }
                    TokenKind::Comma => {
                        p.advance();
                        elements.push(None);
                    }
                    _ => {
                        elements.push(Some(p.parse_assignment_expression()?));
                        if !p.check(&TokenKind::RBracket) {
                            p.require_token(&TokenKind::Comma)?;
                        }
                    }
                }
            }
        })
    }

    fn parse_object_literal(&mut self) -> Result<ExpressionKind, JsError> {
        self.require_token(&TokenKind::LBrace)?;
        self.with_in_allowed(true, |p| {
            let mut properties = Vec::new();
            while !p.match_token(&TokenKind::RBrace) {
                let name = p.parse_property_name()?;
                p.require_token(&TokenKind::Colon)?;
                let value = p.parse_assignment_expression()?;
                properties.push((name, value));
                if !p.check(&TokenKind::RBrace) {
                    p.require_token(&TokenKind::Comma)?;
                }
            }
            Ok(ExpressionKind::Object(properties))
        })
    }

    fn parse_property_name(&mut self) -> Result<JsString, JsError> {
        match &self.current.kind {
            TokenKind::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            TokenKind::Number(n) => {
                let text = number_to_string(*n);
                self.advance();
                Ok(self.intern(&text))
            }
            _ => self.parse_identifier_name(),
        }
    }

    // ============ HELPERS ============

    fn parse_parenthesized(&mut self) -> Result<Expression, JsError> {
        self.require_token(&TokenKind::LParen)?;
        let expression = self.with_in_allowed(true, |p| p.parse_expression())?;
        self.require_token(&TokenKind::RParen)?;
        Ok(expression)
    }

    fn parse_identifier(&mut self) -> Result<JsString, JsError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            TokenKind::Reserved(word) => {
                Err(self.error(&format!("Unexpected reserved word '{}'", word)))
            }
            _ => Err(self.unexpected_token("identifier")),
        }
    }

    /// Identifier after `.` or as an object literal key; keywords are allowed.
    fn parse_identifier_name(&mut self) -> Result<JsString, JsError> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) | TokenKind::Reserved(name) => name.clone(),
            TokenKind::Number(_)
            | TokenKind::String(_)
            | TokenKind::Eof
            | TokenKind::Invalid(_)
            | TokenKind::UnterminatedString
            | TokenKind::UnterminatedComment => {
                return Err(self.unexpected_token("property name"));
            }
            other => {
                let word = other.text();
                if !word.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(self.unexpected_token("property name"));
                }
                self.intern(word)
            }
        };
        self.advance();
        Ok(name)
    }

    fn with_in_allowed<T>(
        &mut self,
        allowed: bool,
        f: impl FnOnce(&mut Self) -> Result<T, JsError>,
    ) -> Result<T, JsError> {
        let saved = std::mem::replace(&mut self.in_allowed, allowed);
        let result = f(self);
        self.in_allowed = saved;
        result
    }

    fn scope(&self) -> &CodeScope {
        &self.scope
    }

    fn scope_mut(&mut self) -> &mut CodeScope {
        &mut self.scope
    }

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.lexer.next_token());
    }

    fn require_token(&mut self, kind: &TokenKind) -> Result<(), JsError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected_token(&kind.describe()))
        }
    }

    /// Automatic semicolon insertion: accept `;`, or nothing before `}`, end
    /// of input or a line terminator.
    fn expect_semicolon(&mut self) -> Result<(), JsError> {
        if self.match_token(&TokenKind::Semicolon) {
            return Ok(());
        }
        if self.at_statement_end() {
            return Ok(());
        }
        Err(self.unexpected_token("';'"))
    }

    fn at_statement_end(&self) -> bool {
        self.is_at_end()
            || self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RBrace)
            || self.lexer.had_newline_before()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn span_from(&self, start: Span) -> Span {
        start.to(self.previous.span)
    }

    fn error_at(&self, message: &str, span: Span) -> JsError {
        JsError::SyntaxError {
            message: message.to_string(),
            location: SourceLocation {
                source: Some(self.source_id),
                line: span.line,
                column: span.column,
            },
        }
    }

    fn error(&self, message: &str) -> JsError {
        self.error_at(message, self.current.span)
    }

    fn unexpected_token(&self, expected: &str) -> JsError {
        let message = match &self.current.kind {
            TokenKind::Invalid(_)
            | TokenKind::UnterminatedString
            | TokenKind::UnterminatedComment => {
                format!("Unexpected {}", self.current.kind.describe())
            }
            kind => format!("Unexpected {}, expected {}", kind.describe(), expected),
        };
        self.error(&message)
    }

    fn current_binary_op(&self) -> Option<(BinaryOrLogical, u8)> {
        let op = match &self.current.kind {
            TokenKind::PipePipe => BinaryOrLogical::Logical(LogicalOp::Or),
            TokenKind::AmpAmp => BinaryOrLogical::Logical(LogicalOp::And),
            TokenKind::Pipe => BinaryOrLogical::Binary(BinaryOp::BitOr),
            TokenKind::Caret => BinaryOrLogical::Binary(BinaryOp::BitXor),
            TokenKind::Amp => BinaryOrLogical::Binary(BinaryOp::BitAnd),
            TokenKind::EqEq => BinaryOrLogical::Binary(BinaryOp::Eq),
            TokenKind::BangEq => BinaryOrLogical::Binary(BinaryOp::NotEq),
            TokenKind::EqEqEq => BinaryOrLogical::Binary(BinaryOp::StrictEq),
            TokenKind::BangEqEq => BinaryOrLogical::Binary(BinaryOp::StrictNotEq),
            TokenKind::Lt => BinaryOrLogical::Binary(BinaryOp::Lt),
            TokenKind::LtEq => BinaryOrLogical::Binary(BinaryOp::LtEq),
            TokenKind::Gt => BinaryOrLogical::Binary(BinaryOp::Gt),
            TokenKind::GtEq => BinaryOrLogical::Binary(BinaryOp::GtEq),
            TokenKind::Instanceof => BinaryOrLogical::Binary(BinaryOp::Instanceof),
            TokenKind::In if self.in_allowed => BinaryOrLogical::Binary(BinaryOp::In),
            TokenKind::LtLt => BinaryOrLogical::Binary(BinaryOp::Shl),
            TokenKind::GtGt => BinaryOrLogical::Binary(BinaryOp::Shr),
            TokenKind::GtGtGt => BinaryOrLogical::Binary(BinaryOp::UShr),
            TokenKind::Plus => BinaryOrLogical::Binary(BinaryOp::Add),
            TokenKind::Minus => BinaryOrLogical::Binary(BinaryOp::Sub),
            TokenKind::Star => BinaryOrLogical::Binary(BinaryOp::Mul),
            TokenKind::Slash => BinaryOrLogical::Binary(BinaryOp::Div),
            TokenKind::Percent => BinaryOrLogical::Binary(BinaryOp::Mod),
            _ => return None,
        };
        let prec = match op {
            BinaryOrLogical::Binary(op) => op.precedence(),
            BinaryOrLogical::Logical(op) => op.precedence(),
        };
        Some((op, prec))
    }

    fn current_unary_op(&self) -> Option<UnaryOp> {
        match &self.current.kind {
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        }
    }

    fn current_update_op(&self) -> Option<UpdateOp> {
        match &self.current.kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        }
    }

    fn current_assignment_op(&self) -> Option<AssignOp> {
        let op = match &self.current.kind {
            TokenKind::Eq => return Some(AssignOp::Assign),
            TokenKind::PlusEq => BinaryOp::Add,
            TokenKind::MinusEq => BinaryOp::Sub,
            TokenKind::StarEq => BinaryOp::Mul,
            TokenKind::SlashEq => BinaryOp::Div,
            TokenKind::PercentEq => BinaryOp::Mod,
            TokenKind::LtLtEq => BinaryOp::Shl,
            TokenKind::GtGtEq => BinaryOp::Shr,
            TokenKind::GtGtGtEq => BinaryOp::UShr,
            TokenKind::AmpEq => BinaryOp::BitAnd,
            TokenKind::PipeEq => BinaryOp::BitOr,
            TokenKind::CaretEq => BinaryOp::BitXor,
            _ => return None,
        };
        Some(AssignOp::Compound(op))
    }
}

#[derive(Clone, Copy)]
enum BinaryOrLogical {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Parse a complete program from source text.
pub fn parse_program(
    source: &str,
    string_dict: &mut StringDict,
    source_id: SourceId,
) -> Result<Program, JsError> {
    Parser::new(source, string_dict, source_id).parse_program()
}
