use heck::{ToLowerCamelCase, ToUpperCamelCase};
use protots_schema::FieldDef;

/// Client-side identifier for a method: `GetUser` → `getUser`.
pub fn call_identifier(method_name: &str) -> String {
    method_name.to_lower_camel_case()
}

/// The JSON-RPC `method` string: `UserService.GetUser`.
pub fn rpc_method(service_name: &str, method_name: &str) -> String {
    format!("{service_name}.{method_name}")
}

/// Property name of a field in generated declarations.
pub fn member_name(field: &FieldDef, keep_case: bool) -> String {
    if keep_case {
        return field.name.clone();
    }
    match &field.json_name {
        Some(json) if !json.is_empty() => json.clone(),
        _ => field.name.to_lower_camel_case(),
    }
}

/// Declaration name derived from a schema identifier: `contact_info` → `ContactInfo`.
pub fn type_ident(name: &str) -> String {
    name.to_upper_camel_case()
}

/// `acme/user.proto` → `acme/user`.
pub fn file_stem(file_name: &str) -> &str {
    file_name.strip_suffix(".proto").unwrap_or(file_name)
}

/// Quote a property name when it is not a valid identifier.
pub fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if valid {
        name.to_string()
    } else {
        format!("\"{name}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_identifiers_are_lower_camel() {
        assert_eq!(call_identifier("GetUser"), "getUser");
        assert_eq!(call_identifier("list_users"), "listUsers");
        assert_eq!(rpc_method("UserService", "GetUser"), "UserService.GetUser");
    }

    #[test]
    fn stems_and_keys() {
        assert_eq!(file_stem("acme/user.proto"), "acme/user");
        assert_eq!(file_stem("README"), "README");
        assert_eq!(type_ident("contact_info"), "ContactInfo");
        assert_eq!(property_key("userId"), "userId");
        assert_eq!(property_key("[acme.ext]"), "\"[acme.ext]\"");
        assert_eq!(property_key("2fa"), "\"2fa\"");
    }
}
