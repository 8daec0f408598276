//! JSON-RPC service modules.
//!
//! Each schema file with services becomes one module holding the envelope
//! types, a descriptor class per service and an axios-backed client class.
//! Requests go out as `{ id, method: "Service.Method", params, jsonrpc }`
//! and the client resolves with `result` or rejects with `error`.
//!
//! Streaming methods keep their descriptors but get no client stub; JSON-RPC
//! over a single POST has no way to carry them.

use std::fmt;

use crate::code_writer::CodeWriter;
use crate::cw_writeln;

use super::service_view::{ImportRef, MethodView};

const AXIOS_IMPORT: &str = r#"import type { AxiosInstance, AxiosRequestConfig } from "axios";"#;

/// A service with its methods already resolved.
pub struct ServiceModel<'a> {
    pub name: &'a str,
    pub full_name: String,
    pub methods: Vec<MethodView<'a>>,
}

/// `// package: ...` and `// file: ...` followed by a blank line.
pub fn write_header<W: fmt::Write>(
    w: &mut CodeWriter<W>,
    package: &str,
    file_name: &str,
) -> fmt::Result {
    cw_writeln!(w, "// package: {package}")?;
    cw_writeln!(w, "// file: {file_name}")?;
    w.blank_line()
}

pub fn write_imports<W: fmt::Write>(w: &mut CodeWriter<W>, imports: &[ImportRef]) -> fmt::Result {
    for import in imports {
        cw_writeln!(w, "import * as {} from \"{}\";", import.namespace, import.path)?;
    }
    Ok(())
}

/// Everything after the header of a file that declares at least one service.
pub fn write_service_module<W: fmt::Write>(
    w: &mut CodeWriter<W>,
    imports: &[ImportRef],
    services: &[ServiceModel<'_>],
) -> fmt::Result {
    write_imports(w, imports)?;
    w.writeln(AXIOS_IMPORT)?;
    w.blank_line()?;
    write_envelopes(w)?;

    for service in services {
        w.blank_line()?;
        write_descriptors(w, service)?;
        w.blank_line()?;
        write_client(w, service)?;
    }
    Ok(())
}

fn write_envelopes<W: fmt::Write>(w: &mut CodeWriter<W>) -> fmt::Result {
    w.block("export interface JsonRpcRequest<T>", |w| {
        w.writeln("id: string;")?;
        w.writeln("method: string;")?;
        w.writeln("params: T;")?;
        w.writeln("jsonrpc: \"2.0\";")
    })?;
    w.blank_line()?;
    w.block("export interface JsonRpcResponse<T>", |w| {
        w.writeln("result: T;")?;
        w.writeln("id: string;")?;
        w.writeln("jsonrpc: \"2.0\";")?;
        w.writeln("error?: { code: number; message: string; data?: unknown };")
    })
}

/// One alias per method, then the descriptor class that ties them together.
fn write_descriptors<W: fmt::Write>(
    w: &mut CodeWriter<W>,
    service: &ServiceModel<'_>,
) -> fmt::Result {
    let name = service.name;

    for method in &service.methods {
        w.delimited(&format!("export type {} = {{", method.alias_name()), "};", |w| {
            cw_writeln!(w, "readonly methodName: \"{}\";", method.declared_name)?;
            cw_writeln!(w, "readonly service: typeof {name};")?;
            cw_writeln!(w, "readonly requestStream: {};", method.client_streaming)?;
            cw_writeln!(w, "readonly responseStream: {};", method.server_streaming)?;
            cw_writeln!(w, "readonly requestType?: {};", method.request_type)?;
            cw_writeln!(w, "readonly responseType?: {};", method.response_type)
        })?;
        w.blank_line()?;
    }

    w.block(&format!("export class {name}"), |w| {
        cw_writeln!(w, "static readonly serviceName = \"{}\";", service.full_name)?;
        for method in &service.methods {
            let header = format!(
                "static readonly {}: {} = {{",
                method.declared_name,
                method.alias_name()
            );
            w.delimited(&header, "};", |w| {
                cw_writeln!(w, "methodName: \"{}\",", method.declared_name)?;
                cw_writeln!(w, "service: {name},")?;
                cw_writeln!(w, "requestStream: {},", method.client_streaming)?;
                cw_writeln!(w, "responseStream: {},", method.server_streaming)
            })?;
        }
        Ok(())
    })
}

fn write_client<W: fmt::Write>(w: &mut CodeWriter<W>, service: &ServiceModel<'_>) -> fmt::Result {
    w.block(&format!("export class {}Client", service.name), |w| {
        w.writeln("readonly serviceHost: string;")?;
        w.writeln("private readonly transport: AxiosInstance;")?;
        w.blank_line()?;
        w.block(
            "constructor(serviceHost: string, transport: AxiosInstance)",
            |w| {
                w.writeln("this.serviceHost = serviceHost;")?;
                w.writeln("this.transport = transport;")
            },
        )?;
        w.blank_line()?;
        write_call_helper(w)?;
        w.blank_line()?;
        write_batch_helper(w)?;

        for method in service.methods.iter().filter(|m| !m.is_streaming()) {
            w.blank_line()?;
            write_stubs(w, method)?;
        }
        Ok(())
    })
}

fn write_call_helper<W: fmt::Write>(w: &mut CodeWriter<W>) -> fmt::Result {
    w.block(
        "private call<TRequest, TResponse>(method: string, params: TRequest, options?: AxiosRequestConfig): Promise<TResponse>",
        |w| {
            w.writeln(
                "const envelope: JsonRpcRequest<TRequest> = { id: \"1\", method, params, jsonrpc: \"2.0\" };",
            )?;
            w.delimited("return new Promise((resolve, reject) => {", "});", |w| {
                w.writeln("this.transport")?;
                let _indent = w.indent();
                w.writeln(".post<JsonRpcResponse<TResponse>>(this.serviceHost, envelope, options)")?;
                w.delimited(".then((response) => {", "})", |w| {
                    w.block("if (response.data.error)", |w| {
                        w.writeln("reject(response.data.error);")?;
                        w.writeln("return;")
                    })?;
                    w.writeln("resolve(response.data.result);")
                })?;
                w.writeln(".catch(reject);")
            })
        },
    )
}

fn write_batch_helper<W: fmt::Write>(w: &mut CodeWriter<W>) -> fmt::Result {
    w.block(
        "private callBatch<TRequest, TResponse>(method: string, params: TRequest[], options?: AxiosRequestConfig): Promise<TResponse[]>",
        |w| {
            w.writeln(
                "const envelopes = params.map((item): JsonRpcRequest<TRequest> => ({ id: \"1\", method, params: item, jsonrpc: \"2.0\" }));",
            )?;
            w.delimited("return new Promise((resolve, reject) => {", "});", |w| {
                w.writeln("this.transport")?;
                let _indent = w.indent();
                w.writeln(".post<JsonRpcResponse<TResponse>[]>(this.serviceHost, envelopes, options)")?;
                w.delimited(".then((response) => {", "})", |w| {
                    w.writeln("const failed = response.data.find((item) => item.error);")?;
                    w.block("if (failed)", |w| {
                        w.writeln("reject(failed.error);")?;
                        w.writeln("return;")
                    })?;
                    w.writeln("resolve(response.data.map((item) => item.result));")
                })?;
                w.writeln(".catch(reject);")
            })
        },
    )
}

/// `getUser(requestMessage, options?)` and `getUserBatch(requestMessages, options?)`.
fn write_stubs<W: fmt::Write>(w: &mut CodeWriter<W>, method: &MethodView<'_>) -> fmt::Result {
    let MethodView {
        call_name,
        request_type: req,
        response_type: resp,
        ..
    } = method;
    let rpc = method.rpc_method();

    w.block(
        &format!(
            "{call_name}(requestMessage: {req}, options?: AxiosRequestConfig): Promise<{resp}>"
        ),
        |w| {
            cw_writeln!(
                w,
                "return this.call<{req}, {resp}>(\"{rpc}\", requestMessage, options);"
            )
        },
    )?;
    w.blank_line()?;
    w.block(
        &format!(
            "{call_name}Batch(requestMessages: {req}[], options?: AxiosRequestConfig): Promise<{resp}[]>"
        ),
        |w| {
            cw_writeln!(
                w,
                "return this.callBatch<{req}, {resp}>(\"{rpc}\", requestMessages, options);"
            )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &'static str, call: &str, streaming: bool) -> MethodView<'static> {
        MethodView {
            call_name: call.into(),
            declared_name: name,
            service_name: "Echo",
            client_streaming: streaming,
            server_streaming: false,
            request_type: "echo.Msg".into(),
            response_type: "echo.Msg".into(),
        }
    }

    fn render(services: &[ServiceModel<'_>]) -> String {
        let imports = [ImportRef {
            namespace: "echo".into(),
            path: "./echo".into(),
        }];
        let mut out = String::new();
        let mut w = CodeWriter::with_indent_spaces(&mut out, 2);
        write_service_module(&mut w, &imports, services).unwrap();
        out
    }

    #[test]
    fn descriptors_cover_streaming_methods() {
        let out = render(&[ServiceModel {
            name: "Echo",
            full_name: "echo.Echo".into(),
            methods: vec![method("Say", "say", false), method("Upload", "upload", true)],
        }]);

        assert!(out.starts_with("import * as echo from \"./echo\";\nimport type { AxiosInstance"));
        assert!(out.contains("export type EchoUpload = {\n  readonly methodName: \"Upload\";\n"));
        assert!(out.contains("  readonly requestStream: true;\n"));
        assert!(out.contains("  static readonly Upload: EchoUpload = {\n"));
        assert!(out.contains("  static readonly serviceName = \"echo.Echo\";\n"));

        assert!(out.contains("  say(requestMessage: echo.Msg, options?: AxiosRequestConfig): Promise<echo.Msg> {\n"));
        assert!(out.contains("    return this.call<echo.Msg, echo.Msg>(\"Echo.Say\", requestMessage, options);\n"));
        assert!(out.contains("  sayBatch(requestMessages: echo.Msg[], options?: AxiosRequestConfig): Promise<echo.Msg[]> {\n"));
        assert!(!out.contains("upload("));
        assert!(!out.contains("uploadBatch("));
    }

    #[test]
    fn helpers_unwrap_result_and_forward_failures() {
        let out = render(&[ServiceModel {
            name: "Echo",
            full_name: "Echo".into(),
            methods: Vec::new(),
        }]);

        let call = r#"  private call<TRequest, TResponse>(method: string, params: TRequest, options?: AxiosRequestConfig): Promise<TResponse> {
    const envelope: JsonRpcRequest<TRequest> = { id: "1", method, params, jsonrpc: "2.0" };
    return new Promise((resolve, reject) => {
      this.transport
        .post<JsonRpcResponse<TResponse>>(this.serviceHost, envelope, options)
        .then((response) => {
          if (response.data.error) {
            reject(response.data.error);
            return;
          }
          resolve(response.data.result);
        })
        .catch(reject);
    });
  }
"#;
        assert!(out.contains(call), "{out}");
        assert!(out.contains("resolve(response.data.map((item) => item.result));"));
        assert!(out.ends_with("}\n"));
    }
}
