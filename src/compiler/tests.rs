//! Unit tests for bytecode generation.

use crate::{
    analyzer::analyzer::analyze,
    backend::backend::{Backend, BackendMode},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

use super::{
    compiler::{compile, BytecodeBackend},
    emitter::Emitter,
    instruction::{
        ArithOp, CompareOp, CompiledProgram, Instruction, Label, NumKind, Signature, ValueType,
    },
};

fn compile_source(source: &str) -> CompiledProgram {
    let analysis = analyze(parse(tokenize(source.to_string()).unwrap()).unwrap());
    assert!(!analysis.has_errors(), "{:?}", analysis.errors);
    compile(&analysis).unwrap()
}

fn without_lines(code: &[Instruction]) -> Vec<Instruction> {
    code.iter()
        .filter(|instruction| !matches!(instruction, Instruction::Line(_)))
        .cloned()
        .collect()
}

fn global(name: &str, ty: ValueType) -> (Instruction, Instruction) {
    (
        Instruction::LoadGlobal {
            name: name.to_string(),
            ty: ty.clone(),
        },
        Instruction::StoreGlobal {
            name: name.to_string(),
            ty,
        },
    )
}

#[test]
fn test_precedence_code() {
    let program = compile_source("program p;\nvar a: integer;\nbegin a := 2 + 3 * 4 end.");
    let (_, store) = global("a", ValueType::Int);

    assert_eq!(
        without_lines(&program.main.code),
        vec![
            Instruction::PushInt(0),
            store.clone(),
            Instruction::PushInt(2),
            Instruction::PushInt(3),
            Instruction::PushInt(4),
            Instruction::Arith {
                op: ArithOp::Mul,
                kind: NumKind::Int
            },
            Instruction::Arith {
                op: ArithOp::Add,
                kind: NumKind::Int
            },
            store,
            Instruction::Return { value: false },
        ]
    );
    assert_eq!(program.main.max_stack, 3);
    assert!(program.main.code.contains(&Instruction::Line(3)));
}

#[test]
fn test_while_layout() {
    let program =
        compile_source("program w;\nvar i: integer;\nbegin\nwhile i < 3 do i := i + 1\nend.");
    let (load, store) = global("i", ValueType::Int);
    let head = Label::from_raw(0);
    let exit = Label::from_raw(1);

    assert_eq!(
        without_lines(&program.main.code),
        vec![
            Instruction::PushInt(0),
            store.clone(),
            Instruction::Label(head),
            load.clone(),
            Instruction::PushInt(3),
            Instruction::Compare {
                op: CompareOp::Lt,
                ty: ValueType::Int
            },
            Instruction::JumpIfFalse(exit),
            load,
            Instruction::PushInt(1),
            Instruction::Arith {
                op: ArithOp::Add,
                kind: NumKind::Int
            },
            store,
            Instruction::Goto(head),
            Instruction::Label(exit),
            Instruction::Return { value: false },
        ]
    );
}

#[test]
fn test_repeat_jumps_back_while_false() {
    let program = compile_source(
        "program r;\nvar i: integer;\nbegin\nrepeat i := i + 1 until i = 3\nend.",
    );
    let code = without_lines(&program.main.code);

    assert_eq!(code[2], Instruction::Label(Label::from_raw(0)));
    assert_eq!(code[code.len() - 2], Instruction::JumpIfFalse(Label::from_raw(0)));
}

#[test]
fn test_for_exits_past_the_bound() {
    let program = compile_source(
        "program f;\nvar i: integer;\nbegin\nfor i := 5 downto 1 do write(i)\nend.",
    );
    let code = without_lines(&program.main.code);

    assert!(code.contains(&Instruction::IfCmp {
        op: CompareOp::Lt,
        ty: ValueType::Int,
        target: Label::from_raw(1),
    }));
    assert!(code.contains(&Instruction::Arith {
        op: ArithOp::Sub,
        kind: NumKind::Int
    }));
    assert!(code.contains(&Instruction::Goto(Label::from_raw(0))));
}

#[test]
fn test_case_lookup_switch() {
    let program = compile_source(
        "program c;\nvar a: integer;\nbegin\ncase a of\n3: a := 0;\n1, 2: a := 1\nelse a := 2\nend\nend.",
    );
    let code = without_lines(&program.main.code);
    let exit = Label::from_raw(0);

    let Some(Instruction::LookupSwitch { keys, default }) = code
        .iter()
        .find(|instruction| matches!(instruction, Instruction::LookupSwitch { .. }))
    else {
        panic!("no lookup switch in {:?}", code);
    };

    assert_eq!(
        keys.iter().map(|(key, _)| *key).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(keys[0].1, keys[1].1);
    assert_ne!(keys[0].1, keys[2].1);
    assert_ne!(*default, exit);
    assert_eq!(
        code.iter()
            .filter(|instruction| **instruction == Instruction::Goto(exit))
            .count(),
        2
    );
}

#[test]
fn test_string_case_hashes_selector() {
    let program = compile_source(
        "program s;\nvar s: string;\nbegin\ncase s of 'a': s := 'b'; 'cd': s := 'e' end\nend.",
    );

    assert!(program.main.code.contains(&Instruction::HashString));
}

#[test]
fn test_call_signature_and_widening() {
    let program = compile_source(
        "program f;\nvar b: boolean;\nfunction check(n: integer; x: real): boolean;\nbegin check := x > n end;\nbegin b := check(1, 2) end.",
    );
    let routine = program.routine("check").unwrap();

    assert_eq!(routine.signature.to_string(), "(ID)Z");
    assert_eq!(routine.locals, 3);
    assert!(routine.code.contains(&Instruction::StoreLocal {
        slot: 2,
        ty: ValueType::Bool
    }));
    assert!(routine.code.ends_with(&[
        Instruction::LoadLocal {
            slot: 2,
            ty: ValueType::Bool
        },
        Instruction::Return { value: true },
    ]));

    let main = without_lines(&program.main.code);
    let call = main
        .iter()
        .position(|instruction| matches!(instruction, Instruction::Call { .. }))
        .unwrap();
    assert_eq!(
        main[call - 3..call],
        [
            Instruction::PushInt(1),
            Instruction::PushInt(2),
            Instruction::IntToReal
        ]
    );
    assert_eq!(
        main[call],
        Instruction::Call {
            routine: "check".to_string(),
            signature: Signature {
                params: vec![ValueType::Int, ValueType::Real],
                result: Some(ValueType::Bool),
            },
        }
    );
}

#[test]
fn test_composites_are_copied() {
    let program = compile_source(
        "program r;\ntype point = record x, y: integer end;\nvar p, q: point; v: array[1..3] of integer;\nbegin\nq := p;\nv[2] := p.x\nend.",
    );
    let code = without_lines(&program.main.code);

    assert_eq!(program.records.len(), 1);
    assert_eq!(program.records[0].class, "point");
    assert!(code.contains(&Instruction::NewDefault(ValueType::Record("point".to_string()))));
    assert!(code.contains(&Instruction::DeepCopy));
    assert!(code.contains(&Instruction::ArrayStore(ValueType::Int)));
    assert!(code.contains(&Instruction::GetField {
        class: "point".to_string(),
        field: "x".to_string(),
        ty: ValueType::Int,
    }));
}

#[test]
fn test_write_and_read_call_externals() {
    let program = compile_source(
        "program w;\nvar n: integer;\nbegin\nreadln(n);\nwriteln('n = ', n:3)\nend.",
    );
    let listing = program.to_string();

    assert!(listing.contains("call_external readInt()I"));
    assert!(listing.contains("call_external skipLine()V"));
    assert!(listing.contains("push_str \"n = %3d\\n\""));
    assert!(listing.contains("new_arg_list 1"));
    assert!(listing.contains("call_external printf"));
}

#[test]
fn test_listing() {
    let program = compile_source(
        "program p;\nvar a: integer;\nprocedure show;\nbegin writeln(a) end;\nbegin show end.",
    );
    let listing = program.to_string();

    assert!(listing.starts_with(".class public p\n"));
    assert!(listing.contains(".field public static a I"));
    assert!(listing.contains(".method public static show()V"));
    assert!(listing.contains(".method public static main()V"));
    assert!(listing.contains("    call show()V"));
}

#[test]
fn test_emitter_underflow() {
    let mut emitter = Emitter::new();
    let error = emitter
        .emit(Instruction::Arith {
            op: ArithOp::Add,
            kind: NumKind::Int,
        })
        .unwrap_err();

    assert_eq!(error.get_error_name(), "InternalFault");
}

#[test]
fn test_emitter_merge_mismatch() {
    let mut emitter = Emitter::new();
    let label = Label::from_raw(0);
    emitter.emit(Instruction::PushBool(true)).unwrap();
    emitter.emit(Instruction::JumpIfFalse(label)).unwrap();
    emitter.emit(Instruction::PushInt(1)).unwrap();

    let error = emitter.place(label).unwrap_err();
    assert_eq!(error.get_error_name(), "InternalFault");
}

#[test]
fn test_emitter_restores_depth_after_jump() {
    let mut emitter = Emitter::new();
    let skip = Label::from_raw(0);
    emitter.emit(Instruction::PushInt(1)).unwrap();
    emitter.emit(Instruction::Goto(skip)).unwrap();
    emitter.emit(Instruction::PushInt(2)).unwrap();
    emitter.place(skip).unwrap();

    assert_eq!(emitter.depth(), 1);
    emitter.emit(Instruction::StoreLocal {
        slot: 0,
        ty: ValueType::Int,
    })
    .unwrap();
    assert!(emitter.finish().is_ok());
}

#[test]
fn test_emitter_leftover_values() {
    let mut emitter = Emitter::new();
    emitter.emit(Instruction::PushInt(1)).unwrap();

    assert!(emitter.finish().is_err());
}

#[test]
fn test_backend_mode() {
    assert_eq!(BytecodeBackend.mode(), BackendMode::Compile);
}

#[test]
fn test_reals_are_doubles() {
    let program = compile_source(
        "program d;\nvar x: real; xs: array[1..2] of real;\nbegin\nread(x);\nxs[1] := x * 2\nend.",
    );
    let listing = program.to_string();

    assert_eq!(ValueType::Real.descriptor(), "D");
    assert_eq!(NumKind::Real.descriptor(), "D");
    assert!(listing.contains(".field public static x D"));
    assert!(listing.contains(".field public static xs [D"));
    assert!(listing.contains("call_external readReal()D"));
    assert!(listing.contains("mul D"));
}
