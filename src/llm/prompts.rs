//! Default prompt templates.
//!
//! Placeholders in curly braces are substituted before the call. Outputs
//! are generated in Spanish to match the product's audience.

pub const DEFAULT_SUMMARIZE_PROMPT: &str = r#"Eres un experto resumidor, capaz de crear resúmenes de diversas longitudes y enfoques.

Resume el siguiente texto en español, con la longitud, el enfoque y el formato especificados. Responde únicamente con el resumen.

Texto: {content}

Longitud: {length}
Enfoque: {focus}
Formato: {format}
"#;

pub const DEFAULT_DESCRIBE_PROMPT: &str = r#"Eres un experto en describir imágenes.

Genera una descripción detallada de la imagen adjunta en español. Responde únicamente con la descripción.
"#;

pub const DEFAULT_REFINE_PROMPT: &str = r#"Eres un editor experto. Un usuario no está satisfecho con un resumen generado y quiere refinarlo.

Texto original: {content}

Resumen inicial: {summary}

Comentario del usuario: {feedback}

Instrucciones de refinamiento: {instructions}

Reescribe el resumen aplicando el comentario y las instrucciones. Responde únicamente con el resumen refinado, en español.
"#;
