//! # Códigos de Estado HTTP
//!
//! El servidor de archivos sólo produce cuatro códigos:
//!
//! - **2xx**: Éxito (200 OK, con el archivo como body)
//! - **4xx**: Error del cliente (400, 404, 408), siempre sin body

/// Representa los códigos de estado HTTP que emite el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - El archivo existe y se envía a continuación
    Ok = 200,

    /// 400 Bad Request - Request line mal formada
    BadRequest = 400,

    /// 404 Not Found - El target no es un archivo regular dentro de la raíz
    NotFound = 404,

    /// 408 Request Timeout - No llegó la request dentro del timeout de inactividad
    RequestTimeout = 408,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::StatusCode;
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::RequestTimeout => "Request Timeout",
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
