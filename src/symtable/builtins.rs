/// Known C library functions, grouped by the header that declares them.
///
/// Groups with a header are loaded only when that header was included by the
/// translation unit. The others are compiler or libc internals which can show
/// up through macro expansion of any header.
pub(crate) struct HeaderGroup {
    pub header: Option<&'static str>,
    pub lines: &'static [&'static str],
}

pub(crate) const GROUPS: &[HeaderGroup] = &[
    HeaderGroup {
        header: None,
        lines: &[
            "int __builtin_expect(int, int) -> darwin.BuiltinExpect",
            "bool __assert_rtn(const char *, const char *, int, const char *) -> darwin.AssertRtn",
            "bool __assert_fail(const char *, const char *, unsigned int, const char *) -> linux.AssertFail",
            "double __builtin_fabs(double) -> darwin.Fabs",
            "float __builtin_fabsf(float) -> darwin.Fabsf",
            "double __builtin_fabsl(double) -> darwin.Fabsl",
            "double __builtin_inf() -> darwin.Inf",
            "float __builtin_inff() -> darwin.Inff",
            "double __builtin_infl() -> darwin.Infl",
            "unsigned int __builtin_bswap32(unsigned int) -> darwin.BSwap32",
            "unsigned long __builtin_bswap64(unsigned long) -> darwin.BSwap64",
            "char *__builtin___strcpy_chk(char *, const char *, unsigned long) -> darwin.BuiltinStrcpy",
            "char *__builtin___strcat_chk(char *, const char *, unsigned long) -> darwin.BuiltinStrcat",
            "unsigned long __builtin_object_size(const void *, int) -> darwin.BuiltinObjectSize",
            "int __istype(int, unsigned int) -> darwin.IsType",
            "int __isctype(int, unsigned int) -> darwin.IsCType",
            "int __tolower(int) -> darwin.ToLower",
            "int __toupper(int) -> darwin.ToUpper",
            "int __maskrune(int, unsigned int) -> darwin.MaskRune",
            "int _IO_getc(FILE *) -> noarch.Fgetc",
            "int _IO_putc(int, FILE *) -> noarch.Fputc",
        ],
    },
    HeaderGroup {
        header: Some("assert.h"),
        lines: &["void assert(int) -> noarch.Assert"],
    },
    HeaderGroup {
        header: Some("ctype.h"),
        lines: &[
            "const unsigned short **__ctype_b_loc() -> linux.CtypeLoc",
            "int tolower(int) -> linux.ToLower",
            "int toupper(int) -> linux.ToUpper",
        ],
    },
    HeaderGroup {
        header: Some("math.h"),
        lines: &[
            "double acos(double) -> math.Acos",
            "double asin(double) -> math.Asin",
            "double atan(double) -> math.Atan",
            "double atan2(double, double) -> math.Atan2",
            "double ceil(double) -> math.Ceil",
            "double cos(double) -> math.Cos",
            "double cosh(double) -> math.Cosh",
            "double exp(double) -> math.Exp",
            "double fabs(double) -> math.Abs",
            "double floor(double) -> math.Floor",
            "double fmod(double, double) -> math.Mod",
            "double ldexp(double, int) -> math.Ldexp",
            "double log(double) -> math.Log",
            "double log10(double) -> math.Log10",
            "double pow(double, double) -> math.Pow",
            "double sin(double) -> math.Sin",
            "double sinh(double) -> math.Sinh",
            "double sqrt(double) -> math.Sqrt",
            "double tan(double) -> math.Tan",
            "double tanh(double) -> math.Tanh",
            "double modf(double, double *) -> $0, $2 = math.Modf($1)",
            "double frexp(double, int *) -> $0, $2 = math.Frexp($1)",
        ],
    },
    HeaderGroup {
        header: Some("stdio.h"),
        lines: &[
            "int printf(const char *, ...) -> noarch.Printf",
            "int scanf(const char *, ...) -> noarch.Scanf",
            "int sprintf(char *, const char *, ...) -> noarch.Sprintf",
            "int snprintf(char *, int, const char *, ...) -> noarch.Snprintf",
            "int putchar(int) -> noarch.Putchar",
            "int puts(const char *) -> noarch.Puts",
            "void perror(const char *) -> noarch.Perror",
            "FILE *fopen(const char *, const char *) -> noarch.Fopen",
            "int fclose(FILE *) -> noarch.Fclose",
            "int remove(const char *) -> noarch.Remove",
            "int rename(const char *, const char *) -> noarch.Rename",
            "int fputs(const char *, FILE *) -> noarch.Fputs",
            "FILE *tmpfile() -> noarch.Tmpfile",
            "char *fgets(char *, int, FILE *) -> noarch.Fgets",
            "void rewind(FILE *) -> noarch.Rewind",
            "int feof(FILE *) -> noarch.Feof",
            "int ferror(FILE *) -> noarch.Ferror",
            "void clearerr(FILE *) -> noarch.Clearerr",
            "char *tmpnam(char *) -> noarch.Tmpnam",
            "int fflush(FILE *) -> noarch.Fflush",
            "int fprintf(FILE *, const char *, ...) -> noarch.Fprintf",
            "int fscanf(FILE *, const char *, ...) -> noarch.Fscanf",
            "int fgetc(FILE *) -> noarch.Fgetc",
            "int fputc(int, FILE *) -> noarch.Fputc",
            "int getc(FILE *) -> noarch.Fgetc",
            "int getchar() -> noarch.Getchar",
            "int putc(int, FILE *) -> noarch.Fputc",
            "int fseek(FILE *, long, int) -> noarch.Fseek",
            "long ftell(FILE *) -> noarch.Ftell",
            "int fread(void *, int, int, FILE *) -> $0 = noarch.Fread(&1, $2, $3, $4)",
            "int fwrite(char *, int, int, FILE *) -> noarch.Fwrite",
            "int fgetpos(FILE *, int *) -> noarch.Fgetpos",
            "int fsetpos(FILE *, int *) -> noarch.Fsetpos",
        ],
    },
    HeaderGroup {
        header: Some("stdlib.h"),
        lines: &[
            "int abs(int) -> noarch.Abs",
            "double atof(const char *) -> noarch.Atof",
            "int atoi(const char *) -> noarch.Atoi",
            "long atol(const char *) -> noarch.Atol",
            "long long atoll(const char *) -> noarch.Atoll",
            "void exit(int) -> noarch.Exit",
            "char *getenv(const char *) -> noarch.Getenv",
            "long labs(long) -> noarch.Labs",
            "long long llabs(long long) -> noarch.Llabs",
            "int rand() -> noarch.Rand",
            "double strtod(const char *, char **) -> noarch.Strtod",
            "float strtof(const char *, char **) -> noarch.Strtof",
            "long strtol(const char *, char **, int) -> noarch.Strtol",
            "long long strtoll(const char *, char **, int) -> noarch.Strtoll",
            "unsigned long strtoul(const char *, char **, int) -> noarch.Strtoul",
            "unsigned long long strtoull(const char *, char **, int) -> noarch.Strtoull",
            "void *malloc(unsigned long) -> noarch.Malloc",
            "void *calloc(unsigned long, unsigned long) -> noarch.Calloc",
            "void free(void *) -> _",
        ],
    },
    HeaderGroup {
        header: Some("string.h"),
        lines: &[
            "unsigned long strlen(const char *) -> noarch.Strlen",
            "char *strcpy(char *, const char *) -> noarch.Strcpy",
            "char *strncpy(char *, const char *, int) -> noarch.Strncpy",
            "char *strcat(char *, const char *) -> noarch.Strcat",
            "char *strerror(int) -> noarch.Strerror",
        ],
    },
    HeaderGroup {
        header: Some("time.h"),
        lines: &[
            "time_t time(time_t *) -> noarch.Time",
            "char *ctime(const time_t *) -> noarch.Ctime",
            "time_t mktime(struct tm *) -> noarch.Mktime",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symtable::functions::FunctionSignature;

    #[test]
    fn every_line_parses() {
        for group in GROUPS {
            for line in group.lines {
                if let Err(e) = FunctionSignature::parse(line) {
                    panic!("{}", e);
                }
            }
        }
    }
}
